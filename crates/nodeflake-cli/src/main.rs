mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use config::{CliArgs, CliConfig, Command};
use nodeflake::{ParsedId, SnowflakeGenerator, SnowflakeId};
use serde::Serialize;
use telemetry::init_telemetry;

/// One decoded ID in `--json` output.
#[derive(Serialize)]
struct IdRecord {
    id: SnowflakeId,
    #[serde(flatten)]
    parsed: ParsedId,
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;

    let generator = config.generator.builder().build()?;
    tracing::debug!(
        node_id = generator.node_id().get(),
        epoch = generator.epoch(),
        "generator ready"
    );

    let mut out = BufWriter::new(io::stdout().lock());
    match config.command {
        Command::Next { count, json } => next(&generator, &mut out, count, json)?,
        Command::Parse { ids, json } => parse(&generator, &mut out, &ids, json)?,
        Command::Describe => writeln!(out, "{}", generator.describe())?,
    }
    out.flush()?;

    Ok(())
}

fn next(
    generator: &SnowflakeGenerator,
    out: &mut impl Write,
    count: usize,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let records = (0..count)
            .map(|_| -> nodeflake::Result<IdRecord> {
                let id = generator.next_id()?;
                Ok(IdRecord {
                    id,
                    parsed: generator.parse(id.to_raw()),
                })
            })
            .collect::<nodeflake::Result<Vec<_>>>()?;
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    for _ in 0..count {
        writeln!(out, "{}", generator.next_id()?)?;
    }
    Ok(())
}

fn parse(
    generator: &SnowflakeGenerator,
    out: &mut impl Write,
    ids: &[u64],
    json: bool,
) -> anyhow::Result<()> {
    let records: Vec<_> = ids
        .iter()
        .map(|&raw| {
            let id = SnowflakeId::from_raw(raw);
            if !id.is_valid() {
                tracing::warn!(id = raw, "reserved bit is set, this is not a generated id");
            }
            IdRecord {
                id,
                parsed: generator.parse(raw),
            }
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:<20} {:>15} {:>7} {:>8}", "id", "timestamp", "node_id", "sequence")?;
    for record in &records {
        writeln!(
            out,
            "{:<20} {:>15} {:>7} {:>8}",
            record.id, record.parsed.timestamp, record.parsed.node_id, record.parsed.sequence
        )?;
    }
    Ok(())
}
