use std::sync::Arc;

use mavlib::Dialect;

#[derive(clap::Args, Debug)]
pub struct InfoOpts {}

impl crate::ToolRun for InfoOpts {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()> {
        println!("dialect: {} ({} messages)", dialect.name(), dialect.len());
        println!();
        println!("{:>8}  {:<28} {:>5} {:>5}  {:>9}", "id", "name", "core", "full", "crc_extra");

        for id in dialect.ids() {
            // ids() only returns registered ids
            let def = match dialect.message_by_id(id) {
                Some(def) => def,
                None => continue,
            };
            let crc_extra = dialect.crc_extra(id).unwrap_or(0);
            println!(
                "{:>8}  {:<28} {:>5} {:>5}  {:>9}",
                def.id(),
                def.name(),
                def.core_payload_size(),
                def.payload_size(),
                crc_extra,
            );
        }
        Ok(())
    }
}
