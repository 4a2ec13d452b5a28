use std::sync::Arc;

use anyhow::Context;
use mavlib::{Dialect, Endpoint, MavVersion, OutgoingMessage};

#[derive(clap::Args, Debug)]
pub struct PackOpts {
    /// Message description, e.g.
    /// `{"message": "HEARTBEAT", "payload": {"type": 6}}`.
    /// Accepts optional `system_id`, `component_id`, `sequence`, and
    /// `version` (1 or 2) keys.
    json: String,

    /// Write the frame to a file instead of hexdumping it.
    #[arg(short, long)]
    output: Option<String>,
}

impl crate::ToolRun for PackOpts {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()> {
        let spec: serde_json::Value =
            serde_json::from_str(&self.json).context("parsing message JSON")?;

        let name = spec["message"]
            .as_str()
            .context("`message` must name a message")?;
        let def = dialect
            .message_by_name(name)
            .with_context(|| format!("message `{}` is not in dialect `{}`", name, dialect.name()))?;

        let mut msg = OutgoingMessage::new(name);
        if let Some(payload) = spec.get("payload") {
            let payload = payload.as_object().context("`payload` must be an object")?;
            for (field_name, value) in payload {
                let field = def
                    .field(field_name)
                    .with_context(|| format!("`{}` has no field `{}`", name, field_name))?;
                msg.payload
                    .insert(field_name.clone(), crate::common::json_to_value(field, value)?);
            }
        }

        msg.system_id = header_byte(&spec, "system_id")?;
        msg.component_id = header_byte(&spec, "component_id")?;
        msg.sequence = header_byte(&spec, "sequence")?;
        msg.protocol_version = match spec.get("version").and_then(|v| v.as_u64()) {
            None => None,
            Some(1) => Some(MavVersion::V1),
            Some(2) => Some(MavVersion::V2),
            Some(other) => anyhow::bail!("unsupported protocol version {}", other),
        };

        let bytes = Endpoint::new(dialect).serialize_message(&msg)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &bytes)?;
                println!("wrote {} bytes to {}", bytes.len(), path);
            }
            None => crate::common::e_hexdump("", &bytes),
        }
        Ok(())
    }
}

fn header_byte(spec: &serde_json::Value, key: &str) -> anyhow::Result<Option<u8>> {
    match spec.get(key) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .with_context(|| format!("`{}` must be a byte", key))?;
            Ok(Some(value))
        }
    }
}
