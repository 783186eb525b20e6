use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn, Level};

use validator_merit::{
    AdminCapability, AuditLog, Collaborators, EngineConfig, EngineError, IncentiveEngine,
    InMemoryFraudOracle, InMemoryReputationOracle, ScoringWeights, Sha256Hasher, SlashReason,
    SlashingParams, VotingWeights,
};

/// One operator command per stdin line
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    // Oracle feeds for the in-process collaborators
    SetReputation { id: String, score: u64 },
    SetFraudScore { id: String, score: u64 },

    RegisterValidator { id: String, stake: u64 },
    AddStake { id: String, amount: u64 },
    ReportMetrics { id: String, performance: u64, uptime: u64 },
    RefreshReputation,
    SetDisqualified { id: String, disqualified: bool },
    Validator { id: String },
    Ranking,

    AdvanceEpoch { at: Option<DateTime<Utc>> },
    SelectBest,

    Slash {
        id: String,
        penalty: u64,
        reason: SlashReason,
        at: Option<DateTime<Utc>>,
    },
    Appeal { record_id: u64 },
    SlashingHistory {
        id: String,
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_page_size")]
        limit: usize,
    },

    FundPool { amount: u64 },
    Distribute,
    Pool,

    RegisterVoter { id: String, stake: u64 },
    VotingPower { id: String },
    CastVote { id: String, at: u64 },
    DelegateVote { from: String, to: String },
    DelegateOf { id: String },
    FlagVoter { id: String },
    ScreenVoter { id: String },

    UpdateScoringWeights { weights: ScoringWeights },
    UpdateVotingWeights { weights: VotingWeights },
    UpdateSlashingParams { params: SlashingParams },
    UpdateEpochInterval { interval_secs: u64 },
    Params,

    Audit {
        #[serde(default = "default_page_size")]
        count: usize,
    },
}

fn default_page_size() -> usize {
    50
}

struct Operator {
    engine: IncentiveEngine,
    cap: AdminCapability,
    reputation: Arc<InMemoryReputationOracle>,
    fraud: Arc<InMemoryFraudOracle>,
    audit: AuditLog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        e
    })?;

    init_logging(&config)?;

    let reputation = Arc::new(InMemoryReputationOracle::default());
    let fraud = Arc::new(InMemoryFraudOracle::default());
    let audit = AuditLog::new(config.audit.max_entries);

    let collaborators = Collaborators {
        reputation: reputation.clone(),
        fraud: fraud.clone(),
        hasher: Arc::new(Sha256Hasher::new()),
        audit: Arc::new(audit.clone()),
    };
    let (engine, cap) = IncentiveEngine::new(config.to_params(), collaborators)
        .context("Failed to initialize incentive engine")?;

    let operator = Operator {
        engine,
        cap,
        reputation,
        fraud,
        audit,
    };

    info!("Validator merit engine ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(line) {
            Ok(command) => {
                debug!(?command, "Dispatching command");
                match operator.dispatch(command).await {
                    Ok(result) => json!({ "ok": true, "result": result }),
                    Err(e) => error_response(&e),
                }
            }
            Err(e) => {
                warn!(error = %e, "Malformed command");
                json!({ "ok": false, "kind": "malformed_command", "error": e.to_string() })
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

fn error_response(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<EngineError>() {
        Some(engine_err) => json!({
            "ok": false,
            "kind": engine_err.kind(),
            "error": engine_err.to_string(),
        }),
        None => json!({ "ok": false, "kind": "internal", "error": format!("{:#}", err) }),
    }
}

impl Operator {
    async fn dispatch(&self, command: Command) -> Result<Value> {
        let engine = &self.engine;
        let cap = &self.cap;

        let value = match command {
            Command::SetReputation { id, score } => {
                self.reputation.set(&id, score);
                json!({ "id": id, "score": score })
            }
            Command::SetFraudScore { id, score } => {
                self.fraud.set_score(&id, score);
                json!({ "id": id, "score": score })
            }

            Command::RegisterValidator { id, stake } => {
                serde_json::to_value(engine.register_validator(&id, stake).await?)?
            }
            Command::AddStake { id, amount } => json!({ "stake": engine.add_stake(&id, amount).await? }),
            Command::ReportMetrics {
                id,
                performance,
                uptime,
            } => {
                engine.report_metrics(cap, &id, performance, uptime).await?;
                Value::Null
            }
            Command::RefreshReputation => {
                json!({ "refreshed": engine.refresh_reputation(cap).await? })
            }
            Command::SetDisqualified { id, disqualified } => {
                engine.set_disqualified(cap, &id, disqualified).await?;
                Value::Null
            }
            Command::Validator { id } => serde_json::to_value(engine.validator(&id).await)?,
            Command::Ranking => serde_json::to_value(engine.ranking().await)?,

            Command::AdvanceEpoch { at } => {
                let epoch = engine.advance_epoch(cap, at.unwrap_or_else(Utc::now)).await?;
                json!({ "epoch": epoch })
            }
            Command::SelectBest => serde_json::to_value(engine.select_best(cap).await?)?,

            Command::Slash {
                id,
                penalty,
                reason,
                at,
            } => serde_json::to_value(
                engine
                    .slash(cap, &id, penalty, reason, at.unwrap_or_else(Utc::now))
                    .await?,
            )?,
            Command::Appeal { record_id } => serde_json::to_value(engine.appeal(cap, record_id).await?)?,
            Command::SlashingHistory { id, offset, limit } => {
                serde_json::to_value(engine.slashing_history(&id, offset, limit).await)?
            }

            Command::FundPool { amount } => json!({ "total_pool": engine.fund_pool(cap, amount).await? }),
            Command::Distribute => serde_json::to_value(engine.distribute(cap).await?)?,
            Command::Pool => serde_json::to_value(engine.pool().await)?,

            Command::RegisterVoter { id, stake } => {
                serde_json::to_value(engine.register_voter(&id, stake).await?)?
            }
            Command::VotingPower { id } => json!({ "power": engine.voting_power(&id).await? }),
            Command::CastVote { id, at } => serde_json::to_value(engine.cast_vote(&id, at).await?)?,
            Command::DelegateVote { from, to } => {
                engine.delegate_vote(&from, &to).await?;
                Value::Null
            }
            Command::DelegateOf { id } => json!({ "delegate": engine.delegate_of(&id).await }),
            Command::FlagVoter { id } => json!({ "fraud_flags": engine.flag_voter(cap, &id).await? }),
            Command::ScreenVoter { id } => serde_json::to_value(engine.screen_voter(cap, &id).await?)?,

            Command::UpdateScoringWeights { weights } => {
                serde_json::to_value(engine.update_scoring_weights(cap, weights).await?)?
            }
            Command::UpdateVotingWeights { weights } => {
                serde_json::to_value(engine.update_voting_weights(cap, weights).await?)?
            }
            Command::UpdateSlashingParams { params } => {
                serde_json::to_value(engine.update_slashing_params(cap, params).await?)?
            }
            Command::UpdateEpochInterval { interval_secs } => {
                serde_json::to_value(engine.update_epoch_interval(cap, interval_secs).await?)?
            }
            Command::Params => serde_json::to_value(engine.params().await)?,

            Command::Audit { count } => serde_json::to_value(self.audit.get_recent(count).await)?,
        };

        Ok(value)
    }
}

/// Install the fmt subscriber on stderr so stdout stays pure JSON
fn init_logging(config: &EngineConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
