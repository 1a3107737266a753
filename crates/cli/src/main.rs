use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use loopengine_sdk::{
    Credentials, DEFAULT_BASE_URL, FEEDBACK_PATH, FeedbackPayload, LoopEngine, SendOptions,
    SignatureHeader, canonicalize, digest, sign,
};

#[derive(Parser)]
#[clap(name = "loopengine", about = "Send signed feedback to the LoopEngine ingest API")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CredentialArgs {
    #[clap(long, env = "LOOPENGINE_PROJECT_KEY")]
    project_key: String,
    #[clap(long, env = "LOOPENGINE_PROJECT_SECRET", hide_env_values = true)]
    project_secret: String,
    #[clap(long, env = "LOOPENGINE_PROJECT_ID")]
    project_id: String,
}

#[derive(Subcommand)]
enum Command {
    /// Send one feedback event and print the normalized result.
    Send {
        #[clap(flatten)]
        credentials: CredentialArgs,
        #[clap(long, env = "LOOPENGINE_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Base payload as a JSON object.
        #[clap(long)]
        payload: Option<String>,
        #[clap(long)]
        message: Option<String>,
        /// Extra field as key=value; the value is parsed as JSON, else kept as a string.
        #[clap(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,

        #[clap(long, allow_negative_numbers = true)]
        geo_lat: Option<f64>,
        #[clap(long, allow_negative_numbers = true)]
        geo_lon: Option<f64>,
    },
    /// Print the digest, canonical string and X-Signature for a raw body.
    Sign {
        #[clap(long, env = "LOOPENGINE_PROJECT_SECRET", hide_env_values = true)]
        project_secret: String,
        /// Exact request body bytes.
        #[clap(long)]
        body: String,
        #[clap(long)]
        timestamp: u64,
    },
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_owned(), value))
}

fn build_payload(
    payload: Option<&str>,
    message: Option<String>,
    fields: Vec<(String, Value)>,
) -> Result<FeedbackPayload> {
    let mut built = match payload {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw).context("parsing --payload as JSON")?;
            FeedbackPayload::try_from(value)?
        }
        None => FeedbackPayload::new(),
    };
    if let Some(message) = message {
        built = built.with_field("message", message);
    }
    for (key, value) in fields {
        built = built.with_field(key, value);
    }
    if built.as_map().is_empty() {
        bail!("nothing to send: pass --message, --field or --payload");
    }
    Ok(built)
}

fn signing_report(secret: &str, body: &str, timestamp: u64) -> Result<Value> {
    let timestamp = timestamp.to_string();
    let body_digest = digest(body.as_bytes());
    let canonical = canonicalize("POST", FEEDBACK_PATH, &timestamp, &body_digest);
    let signature = SignatureHeader::new("v1", sign(secret, &canonical)?);
    Ok(json!({
        "timestamp": timestamp,
        "digest": body_digest,
        "canonical": canonical,
        "x_signature": signature.to_string(),
    }))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Send {
            credentials,
            base_url,
            payload,
            message,
            fields,
            geo_lat,
            geo_lon,
        } => {
            let credentials = Credentials::new(
                credentials.project_key,
                credentials.project_secret,
                credentials.project_id,
            )
            .context("loading credentials")?;
            let client = LoopEngine::builder(credentials)
                .base_url(base_url)
                .build()
                .context("creating client")?;

            let payload = build_payload(payload.as_deref(), message, fields)?;
            let result = client
                .send_with(&payload, &SendOptions { geo_lat, geo_lon })
                .await
                .context("sending feedback")?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.ok {
                tracing::warn!(status = result.status, "Ingest API rejected feedback");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Sign {
            project_secret,
            body,
            timestamp,
        } => {
            let report = signing_report(&project_secret, &body, timestamp)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_is_parsed_as_json() {
        assert_eq!(parse_field("rating=5").unwrap(), ("rating".into(), json!(5)));
        assert_eq!(
            parse_field(r#"tags=["a","b"]"#).unwrap(),
            ("tags".into(), json!(["a", "b"]))
        );
    }

    #[test]
    fn field_value_falls_back_to_string() {
        assert_eq!(
            parse_field("page=/settings").unwrap(),
            ("page".into(), json!("/settings"))
        );
        assert_eq!(parse_field("note=a=b").unwrap(), ("note".into(), json!("a=b")));
    }

    #[test]
    fn field_requires_key_and_separator() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=5").is_err());
    }

    #[test]
    fn payload_merges_sources_in_order() {
        let payload = build_payload(
            Some(r#"{"message":"base","source":"cli"}"#),
            Some("override".into()),
            vec![("rating".into(), json!(4))],
        )
        .unwrap();
        assert_eq!(payload.message(), Some("override"));
        assert_eq!(payload.get("source"), Some(&json!("cli")));
        assert_eq!(payload.get("rating"), Some(&json!(4)));
    }

    #[test]
    fn payload_must_be_object_and_non_empty() {
        assert!(build_payload(Some("[1]"), None, vec![]).is_err());
        assert!(build_payload(None, None, vec![]).is_err());
    }

    #[test]
    fn signing_report_matches_library() {
        let report = signing_report("psk_test", "{}", 1_700_000_000).unwrap();
        let canonical = canonicalize("POST", "/feedback", "1700000000", &digest(b"{}"));
        assert_eq!(report["canonical"], json!(canonical));
        assert_eq!(
            report["x_signature"],
            json!(format!("v1={}", sign("psk_test", &canonical).unwrap()))
        );
    }

    #[test]
    fn negative_longitude_is_accepted() {
        let args = Args::try_parse_from([
            "loopengine",
            "send",
            "--project-key",
            "pk",
            "--project-secret",
            "psk",
            "--project-id",
            "proj",
            "--message",
            "hi",
            "--geo-lat",
            "34.05",
            "--geo-lon",
            "-118.25",
        ])
        .unwrap();
        match args.command {
            Command::Send { geo_lat, geo_lon, .. } => {
                assert_eq!(geo_lat, Some(34.05));
                assert_eq!(geo_lon, Some(-118.25));
            }
            Command::Sign { .. } => panic!("expected send"),
        }
    }
}
