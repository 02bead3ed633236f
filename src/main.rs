use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mediq_eda::api::{EdaApi, HttpApiClient};
use mediq_eda::auth::{FileCredentialStore, ResearcherLogin, ResearcherSignup};
use mediq_eda::config::ApiConfig;
use mediq_eda::eda::{AnalysisRequest, EdaController, SegmentRule, TimeUnit};
use mediq_eda::session::{SessionCreate, SessionStatus, SessionUpdate};
use std::sync::Arc;

/// Research session and EDA client for the MedIQ consent platform
#[derive(Parser)]
#[command(name = "mediq-eda")]
#[command(about = "Explore consent-filtered healthcare datasets", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and store the issued token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
    /// Create a researcher account and store the issued token
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        full_name: String,

        #[arg(long)]
        institution: Option<String>,

        #[arg(long)]
        research_interests: Option<String>,

        #[arg(long)]
        credentials: Option<String>,
    },
    /// Clear stored credentials
    Logout,
    /// Manage research sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Run an analysis under an active research session
    Analyze {
        /// Session id to analyze under (defaults to the first session)
        #[arg(long)]
        session: Option<String>,

        #[command(subcommand)]
        command: AnalyzeCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, optionally filtered by status
    List {
        /// One of: active, paused, completed, archived
        #[arg(long)]
        status: Option<String>,
    },
    /// Create a session and print it
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        purpose: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        institution: Option<String>,

        /// IRB approval number
        #[arg(long)]
        irb: Option<String>,

        /// Requested field names, comma separated
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Show one session by id
    Show { id: String },
    /// Update a session's title, description, or status
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// One of: active, paused, completed, archived
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand)]
enum AnalyzeCommands {
    /// Descriptive statistics per column
    Summary {
        #[arg(long)]
        dataset: String,

        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Distinct value counts for one column
    Unique {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,
    },
    /// Missingness per column
    Missing {
        #[arg(long)]
        dataset: String,

        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Binned distribution of one column
    Histogram {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,

        #[arg(long, default_value_t = 10)]
        bins: u32,
    },
    /// Quartile summary of one column
    Boxplot {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,
    },
    /// Percentile cut points of one column
    Percentiles {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,

        #[arg(long, value_delimiter = ',', default_values_t = [25.0, 50.0, 75.0, 90.0])]
        percentiles: Vec<f64>,
    },
    /// Pairwise correlations across columns
    Correlation {
        #[arg(long)]
        dataset: String,

        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Binned scatter relationship between two columns
    Scatter {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        x: String,

        #[arg(long)]
        y: String,
    },
    /// Metric aggregated per group
    Groupby {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        group_column: String,

        #[arg(long)]
        metric_column: String,
    },
    /// Cohort summary for rule-defined segment; rules as JSON, e.g.
    /// '[{"column":"age","operator":">=","value":65}]'
    Segment {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        rules: String,
    },
    /// Mean of one column over time
    Trend {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,

        /// One of: day, week, month, year
        #[arg(long, default_value = "month")]
        time_unit: String,
    },
    /// Outlier count and non-outlier range of one column
    Outliers {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        column: String,
    },
    /// Generate a report and print its URL
    Report {
        #[arg(long)]
        dataset: String,

        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(verbose >= 2)
        .init();
}

fn to_request(command: AnalyzeCommands) -> Result<AnalysisRequest> {
    Ok(match command {
        AnalyzeCommands::Summary { dataset, columns } => AnalysisRequest::Summary {
            dataset_id: dataset,
            columns,
        },
        AnalyzeCommands::Unique { dataset, column } => AnalysisRequest::Unique {
            dataset_id: dataset,
            column,
        },
        AnalyzeCommands::Missing { dataset, columns } => AnalysisRequest::Missing {
            dataset_id: dataset,
            columns,
        },
        AnalyzeCommands::Histogram {
            dataset,
            column,
            bins,
        } => AnalysisRequest::Histogram {
            dataset_id: dataset,
            column,
            bins,
        },
        AnalyzeCommands::Boxplot { dataset, column } => AnalysisRequest::Boxplot {
            dataset_id: dataset,
            column,
        },
        AnalyzeCommands::Percentiles {
            dataset,
            column,
            percentiles,
        } => AnalysisRequest::Percentiles {
            dataset_id: dataset,
            column,
            percentiles,
        },
        AnalyzeCommands::Correlation { dataset, columns } => AnalysisRequest::Correlation {
            dataset_id: dataset,
            columns,
        },
        AnalyzeCommands::Scatter { dataset, x, y } => AnalysisRequest::Scatter {
            dataset_id: dataset,
            x,
            y,
        },
        AnalyzeCommands::Groupby {
            dataset,
            group_column,
            metric_column,
        } => AnalysisRequest::GroupBy {
            dataset_id: dataset,
            group_column,
            metric_column,
        },
        AnalyzeCommands::Segment { dataset, rules } => AnalysisRequest::Segment {
            dataset_id: dataset,
            rules: serde_json::from_str::<Vec<SegmentRule>>(&rules)
                .context("Invalid segment rules JSON")?,
        },
        AnalyzeCommands::Trend {
            dataset,
            column,
            time_unit,
        } => AnalysisRequest::Trend {
            dataset_id: dataset,
            column,
            time_unit: time_unit.parse::<TimeUnit>()?,
        },
        AnalyzeCommands::Outliers { dataset, column } => AnalysisRequest::Outliers {
            dataset_id: dataset,
            column,
        },
        AnalyzeCommands::Report { dataset, sections } => AnalysisRequest::Report {
            dataset_id: dataset,
            sections,
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ApiConfig::load()?;
    let credentials = Arc::new(FileCredentialStore::new(config.credentials_path()?));
    let api = Arc::new(HttpApiClient::new(&config, credentials)?);

    match cli.command {
        Commands::Login { email, password } => {
            let token = api.login(&ResearcherLogin { email, password }).await?;
            println!("Logged in as {}", token.researcher.email);
        }
        Commands::Signup {
            email,
            password,
            full_name,
            institution,
            research_interests,
            credentials,
        } => {
            let token = api
                .signup(&ResearcherSignup {
                    email,
                    password,
                    full_name,
                    institution,
                    research_interests,
                    credentials,
                })
                .await?;
            println!("Account created for {}", token.researcher.email);
        }
        Commands::Logout => {
            api.logout().await?;
            println!("Logged out");
        }
        Commands::Sessions { command } => match command {
            SessionCommands::List { status } => {
                let status = status
                    .map(|s| s.parse::<SessionStatus>())
                    .transpose()?;
                let response = api.list_sessions(status).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            SessionCommands::Create {
                title,
                purpose,
                description,
                institution,
                irb,
                fields,
            } => {
                let session = api
                    .create_session(&SessionCreate {
                        title,
                        purpose,
                        description,
                        institution,
                        irb_approval_number: irb,
                        requested_fields: fields,
                        ..Default::default()
                    })
                    .await?;
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            SessionCommands::Show { id } => {
                let session = api.get_session(&id).await?;
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            SessionCommands::Update {
                id,
                title,
                description,
                status,
            } => {
                let status = status
                    .map(|s| s.parse::<SessionStatus>())
                    .transpose()?;
                let session = api
                    .update_session(
                        &id,
                        &SessionUpdate {
                            title,
                            description,
                            status,
                            ..Default::default()
                        },
                    )
                    .await?;
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
        },
        Commands::Analyze { session, command } => {
            let controller = EdaController::new(api.clone());
            controller
                .fetch_sessions()
                .await
                .context("Failed to load sessions")?;

            if let Some(id) = session {
                let selected = controller
                    .sessions()
                    .await
                    .into_iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| anyhow!("Session {id} not found"))?;
                controller.set_active_session(Some(selected)).await;
            }

            let request = to_request(command)?;
            match controller.run_analysis(request).await {
                Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
                Err(err) => return Err(anyhow!(err.user_message())),
            }
        }
    }

    Ok(())
}
