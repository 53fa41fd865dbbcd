use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use paeshift_client::accounts::Role;
use paeshift_client::api::{HttpJobApi, JobApi, JobScope};
use paeshift_client::config::ClientConfig;
use paeshift_client::dispatch::ActionDispatcher;
use paeshift_client::jobs::model::{JobFilter, JobId, StatusFilter, format_elapsed};
use paeshift_client::jobs::{PaymentProvider, PaymentQuote};
use paeshift_client::session::Session;
use paeshift_client::validation::{AccountForm, JobForm, LoginForm};

const HELP: &str = "\
Commands:
  login <email> <password>
  signup <client|applicant> <first> <last> <email> <password> <confirm>
  whoami | wallet | refresh | saved
  jobs [all|upcoming|ongoing|completed|canceled] [search...]
  show <job> | actions <job>
  apply <job> | save <job>
  accept <job> <applicant> | decline <job> <applicant>
  start <job> | end <job> | cancel <job>
  feedback <job> <1-5> <text...>
  post                      (prompts for each field)
  pay <job> <paystack|flutterwave>
  verify <job> <provider> <reference>
  /quit";

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ClientConfig::from_env().context("loading configuration")?;

    eprintln!("Paeshift client v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.base_url);
    if let Some(role) = config.role_override {
        eprintln!("   Role override: {role}");
    }
    eprintln!("   Type `help` for commands. /quit to exit.\n");

    let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::new(config.clone())?);
    let dispatcher = ActionDispatcher::new(api, Session::new(), config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if line == "/quit" || line == "quit" {
            break;
        }
        if let Err(e) = run_command(&dispatcher, &line, &mut lines).await {
            eprintln!("error: {e:#}");
        }
        eprint!("> ");
    }
    Ok(())
}

fn job_id(raw: &str) -> anyhow::Result<JobId> {
    raw.parse().with_context(|| format!("invalid job id {raw:?}"))
}

async fn scope(dispatcher: &ActionDispatcher) -> JobScope {
    match dispatcher.role().await {
        Ok(Role::Client) => JobScope::Posted,
        _ => JobScope::All,
    }
}

async fn prompt(lines: &mut Input, label: &str) -> anyhow::Result<String> {
    eprint!("  {label}: ");
    Ok(lines.next_line().await?.unwrap_or_default().trim().to_string())
}

async fn run_command(
    dispatcher: &ActionDispatcher,
    line: &str,
    lines: &mut Input,
) -> anyhow::Result<()> {
    let args: Vec<&str> = line.split_whitespace().collect();
    let session = dispatcher.session();

    match args.as_slice() {
        ["help"] => println!("{HELP}"),

        ["login", email, password] => {
            let form = LoginForm {
                email: email.to_string(),
                password: password.to_string(),
            };
            let response = dispatcher.sign_in(&form).await?;
            let profile = dispatcher.load_profile().await?;
            println!(
                "{} (user {})",
                response.message.unwrap_or_else(|| "Signed in".into()),
                profile.user_id
            );
        }

        ["signup", role, first, last, email, password, confirm] => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let form = AccountForm {
                firstname: first.to_string(),
                lastname: last.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                confirm_password: confirm.to_string(),
            };
            dispatcher.sign_up(&form, role).await?;
            println!("Account created. Sign in with `login`.");
        }

        ["whoami"] => {
            let profile = dispatcher.load_profile().await?;
            println!("{} <{}> [{}]", profile.display_name(), profile.email, profile.role);
        }

        ["wallet"] => {
            let balance = dispatcher.load_wallet_balance().await?;
            println!("Wallet balance: {balance}");
        }

        ["refresh"] => {
            let scope = scope(dispatcher).await;
            dispatcher.refresh(scope).await?;
            println!("Refreshed.");
        }

        ["saved"] => {
            let ids = dispatcher.load_saved_jobs().await?;
            println!("Saved jobs: {ids:?}");
        }

        ["jobs", rest @ ..] => {
            let (status, search) = match rest.first() {
                Some(&"all") => (StatusFilter::All, &rest[1..]),
                Some(word) => match word.parse() {
                    Ok(status) => (StatusFilter::Only(status), &rest[1..]),
                    Err(_) => (StatusFilter::All, rest),
                },
                None => (StatusFilter::All, rest),
            };
            if session.jobs(&JobFilter::default()).await.is_empty() {
                dispatcher.load_jobs(scope(dispatcher).await).await?;
            }
            let filter = JobFilter {
                status,
                search: search.join(" "),
            };
            for job in session.jobs(&filter).await {
                println!(
                    "#{:<5} {:<30} {:<10} {:>10}/hr  {}",
                    job.id, job.title, job.status, job.rate, job.location
                );
            }
        }

        ["show", id] => {
            let id = job_id(id)?;
            let job = dispatcher.load_job(id).await?;
            let quote = PaymentQuote::for_job(&job);
            println!("#{} {} ({})", job.id, job.title, job.status);
            println!("  location: {}", job.location);
            println!("  rate: {}  fee: {}  total: {}", quote.rate, quote.service_fee, quote.total);
            println!("  payment: {:?}", job.payment_status);
            if let Some(elapsed) = job.shift_elapsed(Utc::now()) {
                println!("  on the clock: {}", format_elapsed(elapsed));
            }
            for applicant in &job.applicants {
                println!(
                    "  applicant {} {} ({:?})",
                    applicant.applicant_id, applicant.applicant_name, applicant.status
                );
            }
        }

        ["actions", id] => {
            let actions = dispatcher.visible_actions(job_id(id)?).await?;
            let names: Vec<String> = actions.iter().map(ToString::to_string).collect();
            println!("{}", names.join(", "));
        }

        ["apply", id] => {
            dispatcher.apply_to_job(job_id(id)?).await?;
            println!("Applied.");
        }

        ["save", id] => {
            let saved = dispatcher.toggle_save_job(job_id(id)?).await?;
            println!("{}", if saved { "Saved." } else { "Removed from saved." });
        }

        [verb @ ("accept" | "decline"), id, applicant] => {
            let id = job_id(id)?;
            let applicant: i64 = applicant.parse().context("invalid applicant id")?;
            if *verb == "accept" {
                dispatcher.accept_applicant(id, applicant).await?;
            } else {
                dispatcher.decline_applicant(id, applicant).await?;
            }
            println!("Done.");
        }

        ["start", id] => {
            let job = dispatcher.start_shift(job_id(id)?).await?;
            println!("Shift started for #{}.", job.id);
        }

        ["end", id] => {
            let job = dispatcher.end_shift(job_id(id)?).await?;
            match job.duration {
                Some(hours) => println!("Shift ended after {hours} hours."),
                None => println!("Shift ended."),
            }
        }

        ["cancel", id] => {
            dispatcher.cancel_shift(job_id(id)?).await?;
            println!("Shift canceled.");
        }

        ["feedback", id, rating, text @ ..] => {
            let rating: u8 = rating.parse().context("rating must be a number")?;
            dispatcher
                .submit_feedback(job_id(id)?, rating, &text.join(" "))
                .await?;
            println!("Thanks for the feedback.");
        }

        ["post"] => {
            let form = JobForm {
                title: prompt(lines, "title").await?,
                location: prompt(lines, "location").await?,
                industry: prompt(lines, "industry").await?,
                subcategory: prompt(lines, "subcategory").await?,
                rate: prompt(lines, "rate per hour").await?,
                applicants_needed: prompt(lines, "applicants needed").await?,
                job_type: prompt(lines, "job type (1=single day, 2=multiple days)").await?,
                shift_type: prompt(lines, "shift type (day|night)").await?,
                date: prompt(lines, "date (YYYY-MM-DD)").await?,
                start_time: prompt(lines, "start time (HH:MM)").await?,
                end_time: prompt(lines, "end time (HH:MM)").await?,
            };
            match dispatcher.create_job(&form).await {
                Ok(created) => println!(
                    "Job #{} created (ref {}). Run `pay {} <provider>` to fund it.",
                    created.job_id, created.transaction_ref, created.job_id
                ),
                Err(paeshift_client::error::Error::Validation(errors)) => {
                    for (field, message) in errors.0.iter() {
                        println!("  {field}: {message}");
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        ["pay", id, provider] => {
            let provider: PaymentProvider = provider.parse().map_err(anyhow::Error::msg)?;
            let init = dispatcher.initiate_payment(job_id(id)?, provider).await?;
            println!("Complete payment at {}", init.authorization_url);
            println!("Then run `verify {id} {provider} {}`", init.reference);
        }

        ["verify", id, provider, reference] => {
            let provider: PaymentProvider = provider.parse().map_err(anyhow::Error::msg)?;
            let verification = dispatcher
                .verify_payment(job_id(id)?, provider, reference)
                .await?;
            println!("Payment {}", verification.status);
        }

        _ => bail!("unrecognized command {line:?}; type `help`"),
    }
    Ok(())
}
