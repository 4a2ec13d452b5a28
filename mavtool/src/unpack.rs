use std::sync::Arc;

use mavlib::{Dialect, Endpoint};

#[derive(clap::Args, Debug)]
pub struct UnpackOpts {
    /// Binary file holding one or more frames.
    framefile: String,
}

impl crate::ToolRun for UnpackOpts {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()> {
        let raw = std::fs::read(&self.framefile)?;

        let mut endpoint = Endpoint::new(dialect);
        let messages = endpoint.parse_bytes(&raw);
        anyhow::ensure!(!messages.is_empty(), "no frames found in {}", self.framefile);

        for msg in &messages {
            let mut payload = serde_json::Map::new();
            for (name, value) in &msg.payload {
                payload.insert(name.clone(), crate::common::value_to_json(value));
            }

            let json = serde_json::json!({
                "message": msg.message_name,
                "system_id": msg.system_id,
                "component_id": msg.component_id,
                "sequence": msg.sequence,
                "crc_ok": msg.crc_ok,
                "payload": payload,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Ok(())
    }
}
