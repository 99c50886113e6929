/*
Three thread stream demo: input -> working -> output over two bounded rings
*/
use core::fmt;
use std::time::Duration;

use clap::Parser;
use libc_print::std_name::{print, println};
use tracing_subscriber::EnvFilter;

use bounded_stream::config::{DEFAULT_CAPACITY, DEFAULT_INPUT_MAX};
use bounded_stream::{
    BufferConfig, InputSource, OverflowPolicy, Pipeline, PipelineConfig, UnderflowPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "bounded-stream")]
#[command(about = "Run three pipeline stages connected by two bounded ring buffers")]
struct Cli {
    /// Slot count of both ring buffers.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Upper bound of each blocking wait inside put/take, in milliseconds.
    #[arg(long, default_value_t = 4)]
    wait_timeout_ms: u64,

    /// Number of values the input stage counts through.
    #[arg(long, default_value_t = DEFAULT_INPUT_MAX)]
    input_max: u32,

    /// Delay after each step of every stage, in milliseconds.
    #[arg(long, default_value_t = 8)]
    delay_ms: u64,

    /// What put does when a ring stays full.
    #[arg(long, value_enum, default_value_t = OverflowPolicy::EvictOldest)]
    overflow: OverflowPolicy,

    /// What take does when a ring stays empty.
    #[arg(long, value_enum, default_value_t = UnderflowPolicy::ReturnStale)]
    underflow: UnderflowPolicy,

    /// Read integers from stdin instead of counting.
    #[arg(long)]
    stdin: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let buffer = BufferConfig::new(self.capacity)
            .with_wait_timeout(Duration::from_millis(self.wait_timeout_ms))
            .with_overflow(self.overflow)
            .with_underflow(self.underflow);
        let input = if self.stdin {
            InputSource::Stdin
        } else {
            InputSource::Counter(self.input_max)
        };
        PipelineConfig {
            buffer,
            input,
            stage_delay: Duration::from_millis(self.delay_ms),
        }
    }
}

// stdout through libc, unbuffered so every '\r' update shows right away
struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print!("{}", s);
        Ok(())
    }
}

fn main() -> bounded_stream::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config();

    println!("starting ...");
    let report = Pipeline::run(&config, &mut Console)?;
    println!("\nFinished.");
    println!("{}", report);
    Ok(())
}
