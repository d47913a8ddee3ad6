//! Decoding, epoch assembly and positioning, over one observable stream.
use std::io::{Read, Write};

use log::{debug, error, info};

use crate::{
    assembler::{EpochAssembler, EpochBatch, FlushCause},
    builder::ObservationBuilder,
    config::Config,
    decoder::Decoder,
    engine::PositioningEngine,
    navigation::NavigationStore,
    report::ErrorReporter,
    Error,
};

/// Why stream processing stopped
#[derive(Debug, Default)]
pub enum Termination {
    #[default]
    EndOfStream,
    /// Malformed frame: stream was not consumed entirely
    Malformed(Error),
}

/// Stream processing statistics
#[derive(Debug, Default)]
pub struct Summary {
    /// Decoded observations
    pub observations: usize,
    /// Flushed epochs
    pub epochs: usize,
    /// Records handed to the positioning engine
    pub records: usize,
    pub solutions: usize,
    /// Channels reused without time change
    pub anomalies: usize,
    /// Channels at or beyond the configured channel count
    pub out_of_bound_channels: usize,
    pub quantization_errors: usize,
    pub termination: Termination,
}

/// [Pipeline] owns all processing state: the epoch being assembled,
/// the navigation store, the positioning engine and the report output.
pub struct Pipeline<N: NavigationStore, E: PositioningEngine, W: Write> {
    cfg: Config,
    week: u32,
    nav: N,
    engine: E,
    assembler: EpochAssembler,
    builder: ObservationBuilder,
    reporter: Option<ErrorReporter>,
    output: W,
    summary: Summary,
}

impl<N: NavigationStore, E: PositioningEngine, W: Write> Pipeline<N, E, W> {
    /// Deploys a new [Pipeline]. Report lines are written to `output`.
    pub fn new(cfg: Config, nav: N, engine: E, output: W) -> Result<Self, Error> {
        let week = nav.week().ok_or(Error::NoNavigationData)?;
        Ok(Self {
            week,
            nav,
            engine,
            output,
            assembler: EpochAssembler::new(cfg.channels, cfg.tow_epsilon_s),
            builder: ObservationBuilder::new(cfg.constellation, cfg.cn0_estimate_dbhz),
            reporter: cfg.reference_ecef_m.map(ErrorReporter::new),
            summary: Summary::default(),
            cfg,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes `reader` until end of stream or first malformed frame.
    /// Only I/O errors (on either side) are returned as errors.
    pub fn run<R: Read>(&mut self, reader: R) -> Result<Summary, Error> {
        let mut decoder = Decoder::new(reader);

        for decoded in &mut decoder {
            let decoded = match decoded {
                Ok(decoded) => decoded,
                Err(e) if e.is_malformed() => {
                    error!("{}: stream terminated", e);
                    self.summary.termination = Termination::Malformed(e);
                    break;
                },
                Err(e) => return Err(e),
            };

            self.summary.observations += 1;

            if decoded.has_quantization_error() {
                self.summary.quantization_errors += 1;
            }

            if decoded.channel as usize >= self.cfg.channels {
                self.summary.out_of_bound_channels += 1;
            }

            if let Some(batch) = self.assembler.push(decoded.channel, decoded.observation) {
                self.process(batch)?;
            }
        }

        if self.cfg.flush_on_eof {
            if let Some(batch) = self.assembler.finish() {
                self.process(batch)?;
            }
        } else if self.assembler.pending() > 0 {
            debug!(
                "dropping last epoch ({} pending observations)",
                self.assembler.pending()
            );
        }

        info!("{} observations", self.summary.observations);
        Ok(std::mem::take(&mut self.summary))
    }

    fn process(&mut self, batch: EpochBatch) -> Result<(), Error> {
        self.summary.epochs += 1;
        if batch.cause == FlushCause::ChannelReuse {
            self.summary.anomalies += 1;
        }

        let records = self.builder.build(&batch, self.week);
        if records.is_empty() {
            return Ok(());
        }

        self.summary.records += records.len();

        if let Some(solution) = self.engine.solve(&records, &self.nav) {
            self.summary.solutions += 1;
            if let Some(reporter) = &self.reporter {
                reporter.report(&solution, &mut self.output)?;
            }
        }
        Ok(())
    }
}
