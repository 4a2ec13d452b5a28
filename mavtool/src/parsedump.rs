use std::sync::Arc;

use mavlib::{Dialect, Endpoint};

#[derive(clap::Args, Debug)]
pub struct ParseDumpOpts {
    /// Raw capture of link bytes.
    dumpfile: String,

    /// Bytes fed to the parser per step; small values exercise
    /// re-assembly across reads.
    #[arg(long, default_value_t = 1024)]
    chunk: usize,
}

impl crate::ToolRun for ParseDumpOpts {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()> {
        let raw = std::fs::read(&self.dumpfile)?;

        let mut endpoint = Endpoint::new(dialect.clone());
        let mut total = 0usize;
        let mut bad = 0usize;

        for chunk in raw.chunks(self.chunk.max(1)) {
            for msg in endpoint.parse_bytes(chunk) {
                total += 1;
                if !msg.crc_ok {
                    bad += 1;
                }
                crate::common::print_message(&msg, dialect.message_by_id(msg.message_id));
                println!();
            }
        }

        println!(
            "{} bytes, {} messages, {} with bad checksum",
            raw.len(),
            total,
            bad
        );
        Ok(())
    }
}
