mod config;
mod corpus;
mod index;
mod lang;
mod search;
#[cfg(test)]
mod testing;
mod text;
mod translate;

pub const USER_AGENT: &str = concat!("docsearch/", env!("CARGO_PKG_VERSION"));

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use config::Config;
use index::Bm25Params;
use search::format::{format_context, format_outcome, to_json};
use search::SearchSession;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Rank plain-text documents against a question, across languages.
#[derive(Parser)]
#[command(name = "docsearch", version, about)]
struct Args {
    /// Folder holding the corpus.
    #[arg(long)]
    docs: Option<PathBuf>,

    /// Number of documents to return.
    #[arg(long)]
    top_k: Option<usize>,

    /// BM25 term-frequency saturation (finite, >= 0).
    #[arg(long, value_parser = parse_k1, allow_negative_numbers = true)]
    k1: Option<f64>,

    /// BM25 length normalization, from 0 to 1.
    #[arg(long, value_parser = parse_b, allow_negative_numbers = true)]
    b: Option<f64>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Rebuild the index for every question.
    #[arg(long)]
    rebuild: bool,

    /// Never call the translation service.
    #[arg(long)]
    no_translate: bool,

    /// Print the text of each ranked document.
    #[arg(long)]
    context: bool,

    /// Question to answer once; omit for an interactive session
    /// (`reload` rereads the folder, `exit` quits).
    question: Option<String>,
}

fn parse_k1(raw: &str) -> Result<f64, String> {
    let k1: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if Bm25Params::valid_k1(k1) {
        Ok(k1)
    } else {
        Err(format!("k1 must be finite and non-negative, got {k1}"))
    }
}

fn parse_b(raw: &str) -> Result<f64, String> {
    let b: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if Bm25Params::valid_b(b) {
        Ok(b)
    } else {
        Err(format!("b must be between 0 and 1, got {b}"))
    }
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(docs) = &self.docs {
            config.docs_dir = docs.clone();
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(k1) = self.k1 {
            config.bm25.k1 = k1;
        }
        if let Some(b) = self.b {
            config.bm25.b = b;
        }
        if self.rebuild {
            config.rebuild_per_query = true;
        }
        if self.no_translate {
            config.translation.api_url = None;
        }
    }
}

type Session = SearchSession<translate::HttpTranslator, text::StopwordDetector>;

async fn answer(
    session: &mut Session,
    args: &Args,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = session.search(question).await?;
    let report = if args.json {
        serde_json::to_string_pretty(&to_json(&outcome))?
    } else if args.context {
        format_context(&outcome, &session.context_for(&outcome.results))
    } else {
        format_outcome(&outcome)
    };
    println!("{report}");
    Ok(())
}

async fn repl(session: &mut Session, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("question> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.eq_ignore_ascii_case("reload") {
            session.reload();
            continue;
        }

        let cancelled = tokio::select! {
            result = answer(session, args, question) => {
                if let Err(e) = result {
                    eprintln!("error: {e}");
                }
                false
            }
            _ = tokio::signal::ctrl_c() => true,
        };
        if cancelled {
            eprintln!("search cancelled at stage {}", session.stage());
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docsearch=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    args.apply(&mut config);

    let mut session = SearchSession::from_config(config)?;
    info!(
        docs = %session.config().docs_dir.display(),
        top_k = session.config().top_k,
        "starting docsearch"
    );

    match &args.question {
        Some(question) => {
            tokio::select! {
                result = answer(&mut session, &args, question) => result?,
                _ = tokio::signal::ctrl_c() => eprintln!("search cancelled"),
            }
        }
        None => repl(&mut session, &args).await?,
    }

    info!("stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "docsearch",
            "--docs",
            "/srv/corpus",
            "--top-k",
            "5",
            "--k1",
            "1.2",
            "--rebuild",
            "--no-translate",
            "what are mammals",
        ]);
        let mut config = Config {
            translation: config::TranslationConfig {
                api_url: Some("http://localhost:5000".into()),
                ..Default::default()
            },
            ..Config::default()
        };
        args.apply(&mut config);

        assert_eq!(config.docs_dir, PathBuf::from("/srv/corpus"));
        assert_eq!(config.top_k, 5);
        assert_eq!(config.bm25.k1, 1.2);
        assert_eq!(config.bm25.b, 0.75);
        assert!(config.rebuild_per_query);
        assert!(config.translation.api_url.is_none());
        assert_eq!(args.question.as_deref(), Some("what are mammals"));
    }

    #[test]
    fn out_of_range_bm25_flags_are_rejected() {
        for bad in [["--k1", "-2"], ["--k1", "NaN"], ["--k1", "inf"], ["--b", "1.5"], ["--b", "NaN"]] {
            let parsed = Args::try_parse_from(["docsearch", bad[0], bad[1]]);
            assert!(parsed.is_err(), "{bad:?} accepted");
        }
        let args = Args::try_parse_from(["docsearch", "--k1", "0", "--b", "1"]).unwrap();
        assert_eq!(args.k1, Some(0.0));
        assert_eq!(args.b, Some(1.0));
    }

    #[test]
    fn no_question_means_interactive() {
        let args = Args::parse_from(["docsearch"]);
        assert!(args.question.is_none());
        assert!(!args.json);
    }
}
