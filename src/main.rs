use clap::{Parser, Subcommand};
use log::{error, info};
use serde_json::Value;
use solr_client::{
    escape, phrase, setting_log, to_document, BatchOptions, BoxedError, CommitOptions,
    CommitWithin, Document, HyperTransport, IndexOptions, OptimizeOptions, Params, Settings, Solr,
    SolrRegistry,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "solr_client")]
#[command(about = "Send update and search requests to a configured Solr instance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (extension optional)
    #[arg(long, default_value = "solr", global = true)]
    config: String,

    /// Instance name in the settings file
    #[arg(long, default_value = "default", global = true)]
    instance: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
        /// Extra parameter as key=value, repeat a key for multiple values
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Index one JSON document
    Index {
        document: String,
        #[arg(long)]
        no_overwrite: bool,
        /// Commit within the given milliseconds
        #[arg(long, conflicts_with = "commit")]
        commit_within: Option<u64>,
        /// Commit right away
        #[arg(long)]
        commit: bool,
        #[arg(long)]
        boost: Option<f64>,
    },
    /// Index a JSON array of documents read from a file
    BatchIndex {
        file: String,
        #[arg(long)]
        no_overwrite: bool,
        #[arg(long, conflicts_with = "commit")]
        commit_within: Option<u64>,
        #[arg(long)]
        commit: bool,
    },
    /// Delete documents matching a query
    Remove { query: String },
    /// Delete a document by unique key
    RemoveById { id: String },
    /// Delete documents by unique keys
    RemoveByIds {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Commit {
        #[arg(long)]
        soft: bool,
        #[arg(long)]
        no_wait_searcher: bool,
        #[arg(long)]
        expunge_deletes: bool,
    },
    Optimize {
        #[arg(long)]
        soft: bool,
        #[arg(long)]
        no_wait_searcher: bool,
        #[arg(long, default_value_t = 1)]
        max_segments: u32,
    },
    Rollback,
    /// Print a value escaped for the query parser
    Escape {
        value: String,
        /// Wrap as a phrase
        #[arg(long)]
        phrase: bool,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", s))
}

/// 같은 키가 여러 번 나오면 배열로 합침
fn to_params(pairs: Vec<(String, String)>) -> Params {
    let mut params = Params::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                params.insert(key, Value::String(value));
            }
        }
    }
    params
}

fn commit_within(commit: bool, millis: Option<u64>) -> CommitWithin {
    match millis {
        Some(millis) => CommitWithin::Millis(millis),
        None => CommitWithin::Commit(commit),
    }
}

/// 명령 실행 결과
#[derive(Debug, PartialEq)]
enum Output {
    /// 그대로 출력
    Text(String),
    /// Solr 응답. JSON으로 출력
    Json(Value),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Output::Text(text)) => println!("{}", text),
        Ok(Output::Json(response)) => match serde_json::to_string_pretty(&response) {
            Ok(pretty) => println!("{}", pretty),
            Err(e) => error!("{}", e),
        },
        Err(e) => {
            // 로거 설정 전에 실패할 수 있으므로 stderr로 출력
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// 설정을 읽고 로거를 켠 뒤 `instance` 클라이언트를 꺼냄
fn connect(config: &str, instance: &str) -> Result<Arc<Solr>, BoxedError> {
    let settings = Settings::load(config)?;
    setting_log::setup_logger(&settings.log)?;

    let registry = SolrRegistry::from_settings(&settings, Arc::new(HyperTransport::new()));
    let solr = registry.get(instance)?;
    info!("instance: {}", solr.name());
    Ok(solr)
}

async fn run(cli: Cli) -> Result<Output, BoxedError> {
    let Cli {
        command,
        config,
        instance,
    } = cli;

    let response = match command {
        // escape는 설정 없이 동작
        Commands::Escape {
            value,
            phrase: as_phrase,
        } => {
            let escaped = if as_phrase { phrase(&value) } else { escape(&value) };
            return Ok(Output::Text(escaped));
        }
        Commands::Search {
            query,
            offset,
            limit,
            params,
        } => {
            let solr = connect(&config, &instance)?;
            solr.search(&query, offset, limit, &to_params(params)).await?
        }
        Commands::Index {
            document,
            no_overwrite,
            commit_within: millis,
            commit,
            boost,
        } => {
            let value: Value = serde_json::from_str(&document)?;
            let document = to_document(&value)?;
            let options = IndexOptions {
                overwrite: !no_overwrite,
                commit_within: commit_within(commit, millis),
                boost,
            };
            connect(&config, &instance)?.index(&document, options).await?
        }
        Commands::BatchIndex {
            file,
            no_overwrite,
            commit_within: millis,
            commit,
        } => {
            let solr = connect(&config, &instance)?;
            let contents = tokio::fs::read_to_string(&file).await?;
            let values: Vec<Value> = serde_json::from_str(&contents)?;
            let documents = values
                .iter()
                .map(|value| to_document(value))
                .collect::<Result<Vec<Document>, _>>()?;
            info!("{} documents read from {}", documents.len(), file);

            let options = BatchOptions {
                overwrite: !no_overwrite,
                commit_within: commit_within(commit, millis),
            };
            solr.batch_index(&documents, options).await?
        }
        Commands::Remove { query } => connect(&config, &instance)?.remove(&query).await?,
        Commands::RemoveById { id } => connect(&config, &instance)?.remove_by_id(&id).await?,
        Commands::RemoveByIds { ids } => {
            connect(&config, &instance)?.remove_by_ids(ids.as_slice()).await?
        }
        Commands::Commit {
            soft,
            no_wait_searcher,
            expunge_deletes,
        } => {
            let options = CommitOptions {
                soft_commit: soft,
                wait_searcher: !no_wait_searcher,
                expunge_deletes,
            };
            connect(&config, &instance)?.commit(options).await?
        }
        Commands::Optimize {
            soft,
            no_wait_searcher,
            max_segments,
        } => {
            let options = OptimizeOptions {
                soft_commit: soft,
                wait_searcher: !no_wait_searcher,
                max_segments,
            };
            connect(&config, &instance)?.optimize(options).await?
        }
        Commands::Rollback => connect(&config, &instance)?.rollback().await?,
    };

    Ok(Output::Json(response))
}
