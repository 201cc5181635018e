//! `cms seed`: reference tables plus randomly generated people, messages,
//! payments and reports, all written through the CRUD engine.

use anyhow::{bail, Context};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use clap::Args;
use rand::{distributions::Alphanumeric, rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cli::{utils::output_success, OutputFormat};
use crate::engine::{CrudEngine, CrudError};
use crate::store::column;

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, default_value = "25", help = "Number of people to generate")]
    pub people: usize,
    #[arg(long, default_value = "50", help = "Number of internal messages to generate")]
    pub messages: usize,
    #[arg(long, default_value = "50", help = "Number of payments to generate")]
    pub payments: usize,
    #[arg(long, default_value = "50", help = "Number of monthly reports to generate")]
    pub reports: usize,
    #[arg(long, help = "RNG seed for reproducible data")]
    pub seed: Option<u64>,
}

const PERMISSION_LEVELS: &[(&str, &str)] = &[
    ("ADM", "Administrator"),
    ("USR", "User"),
    ("MOD", "Moderator"),
    ("MGR", "Manager"),
    ("DEV", "Developer"),
    ("SUP", "Support"),
    ("HR", "Human Resources"),
    ("FIN", "Finance"),
    ("MK", "Marketing"),
    ("OPS", "Operations"),
    ("ENG", "Engineer"),
    ("SA", "Sales"),
    ("IT", "IT Specialist"),
    ("PM", "Project Manager"),
    ("TL", "Team Leader"),
    ("ACCT", "Accountant"),
    ("DES", "Designer"),
    ("QAS", "Quality Assurance Specialist"),
    ("CS", "Customer Service"),
    ("BD", "Business Development"),
    ("COO", "Chief Operating Officer"),
    ("CFO", "Chief Financial Officer"),
    ("CEO", "Chief Executive Officer"),
    ("CTO", "Chief Technology Officer"),
    ("CIO", "Chief Information Officer"),
];

const COUNTRIES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("Canada", "CA"),
    ("Mexico", "MX"),
    ("United Kingdom", "GB"),
    ("Germany", "DE"),
    ("France", "FR"),
    ("Spain", "ES"),
    ("Italy", "IT"),
    ("Japan", "JP"),
    ("Australia", "AU"),
    ("Brazil", "BR"),
    ("India", "IN"),
];

const ROLES: &[(&str, &str)] = &[
    ("MGR", "Manager Role"),
    ("USR", "User"),
    ("STF", "Staff"),
    ("CON", "Contractor"),
    ("AUD", "Auditor"),
];

const PAYMENT_METHODS: &[&str] = &["CREDIT", "DEBIT", "CASH", "BANK_TRANSFER", "CHEQUE"];

const WORDS: &[&str] = &[
    "account", "quarter", "budget", "review", "client", "meeting", "schedule", "invoice", "update",
    "project", "team", "report", "target", "summary", "contract", "delivery", "support", "office",
    "planning", "request", "status", "figures", "renewal", "training", "policy", "audit",
];

const NAMES: &[&str] = &[
    "alex", "sam", "jordan", "taylor", "casey", "morgan", "riley", "jamie", "drew", "quinn", "avery",
    "reese", "rowan", "skyler", "emerson", "harper",
];

/// Small random-data generator backed by a seedable RNG
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn user_name(&mut self) -> String {
        let name = NAMES.choose(&mut self.rng).copied().unwrap_or("user");
        let word = WORDS.choose(&mut self.rng).copied().unwrap_or("x");
        format!("{}.{}{}", name, word, self.rng.gen_range(10..10_000))
    }

    pub fn password(&mut self, length: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    pub fn sentence(&mut self, words: usize) -> String {
        let mut picked: Vec<&str> = (0..words.max(1))
            .filter_map(|_| WORDS.choose(&mut self.rng).copied())
            .collect();
        let first = capitalize(picked.remove(0));
        let rest = picked.join(" ");
        if rest.is_empty() {
            format!("{}.", first)
        } else {
            format!("{} {}.", first, rest)
        }
    }

    /// Sentences joined until the next one would pass `max_chars`
    pub fn text(&mut self, max_chars: usize) -> String {
        let mut text = String::new();
        loop {
            let words = self.rng.gen_range(4..10);
            let sentence = self.sentence(words);
            let needed = if text.is_empty() { sentence.len() } else { sentence.len() + 1 };
            if text.len() + needed > max_chars {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&sentence);
        }
        if text.is_empty() {
            text = self.sentence(1).chars().take(max_chars).collect();
        }
        text
    }

    /// A day between January 1st and today
    pub fn date_this_year(&mut self) -> NaiveDate {
        let today = Utc::now().date_naive();
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let span = (today - start).num_days().max(0);
        start + Duration::days(self.rng.gen_range(0..=span))
    }

    pub fn datetime_this_year(&mut self) -> String {
        let date = self.date_this_year();
        let hour = self.rng.gen_range(0..24);
        let minute = self.rng.gen_range(0..60);
        format!("{} {:02}:{:02}:00", date.format("%Y-%m-%d"), hour, minute)
    }

    pub fn amount(&mut self, low: f64, high: f64) -> f64 {
        (self.rng.gen_range(low..high) * 100.0).round() / 100.0
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Counts {
    pub inserted: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub permission_levels: Counts,
    pub countries: Counts,
    pub roles: Counts,
    pub people: Counts,
    pub internal_messages: Counts,
    pub payments: Counts,
    pub monthly_reports: Counts,
}

/// Insert items one at a time; a store failure on one row is logged and skipped
async fn insert_each(engine: &CrudEngine<'_>, resource: &str, items: Vec<Value>) -> Result<Counts, CrudError> {
    let mut counts = Counts::default();
    for item in items {
        match engine.create(resource, &item).await {
            Ok(n) => counts.inserted += n,
            Err(CrudError::Store(e)) => {
                warn!("Error inserting into {}: {}", resource, e);
                counts.failed += 1;
            }
            Err(other) => return Err(other),
        }
    }
    info!("Seeded {}: {} inserted, {} failed", resource, counts.inserted, counts.failed);
    Ok(counts)
}

async fn column_values(engine: &CrudEngine<'_>, resource: &str, name: &str) -> anyhow::Result<Vec<Value>> {
    let values: Vec<Value> = engine
        .list(resource)
        .await?
        .iter()
        .filter_map(|row| column(row, name).cloned())
        .filter(|v| !v.is_null())
        .collect();
    if values.is_empty() {
        bail!("no {} available to reference while seeding", resource);
    }
    Ok(values)
}

fn pairs(resource_pairs: &[(&str, &str)], first: &str, second: &str) -> Vec<Value> {
    resource_pairs
        .iter()
        .map(|(a, b)| {
            let mut map = serde_json::Map::new();
            map.insert(first.to_string(), json!(a));
            map.insert(second.to_string(), json!(b));
            Value::Object(map)
        })
        .collect()
}

pub async fn seed(engine: &CrudEngine<'_>, args: &SeedArgs, faker: &mut Faker) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    report.permission_levels = insert_each(
        engine,
        "permission_levels",
        pairs(PERMISSION_LEVELS, "Permission_Level_Code", "Permission_Level_Description"),
    )
    .await?;
    report.countries = insert_each(engine, "countries", pairs(COUNTRIES, "Country_Name", "Country_Code")).await?;
    report.roles = insert_each(engine, "roles", pairs(ROLES, "Role_Code", "Role_Description")).await?;

    let countries = column_values(engine, "countries", "Country_Name").await?;
    let roles = column_values(engine, "roles", "Role_Description").await?;
    let levels = column_values(engine, "permission_levels", "Permission_Level_Code").await?;

    let people: Vec<Value> = (0..args.people)
        .map(|_| {
            json!({
                "Permission_Level_Code": faker.pick(&levels),
                "Login_Name": faker.user_name(),
                "Password": faker.password(12),
                "Personal_Details": faker.text(200),
                "Other_Details": faker.text(200),
                "Country_Name": faker.pick(&countries),
                "Role_Description": faker.pick(&roles),
            })
        })
        .collect();
    report.people = insert_each(engine, "people", people).await?;

    let person_ids = column_values(engine, "people", "Person_ID").await?;
    if person_ids.len() < 2 {
        bail!("at least two people are required to generate messages");
    }

    let mut messages = Vec::with_capacity(args.messages);
    for _ in 0..args.messages {
        let from = faker.pick(&person_ids).context("no people")?;
        let mut to = faker.pick(&person_ids).context("no people")?;
        while to == from {
            to = faker.pick(&person_ids).context("no people")?;
        }
        messages.push(json!({
            "msg_from_person_id": from,
            "msg_to_person_id": to,
            "date_message_sent": faker.datetime_this_year(),
            "message_subject": faker.sentence(6),
            "message_text": faker.text(500),
        }));
    }
    report.internal_messages = insert_each(engine, "internal_messages", messages).await?;

    let payments: Vec<Value> = (0..args.payments)
        .map(|_| {
            json!({
                "amount": faker.amount(50.0, 1000.0),
                "payment_date": faker.date_this_year().format("%Y-%m-%d").to_string(),
                "payment_method": faker.pick(PAYMENT_METHODS),
            })
        })
        .collect();
    report.payments = insert_each(engine, "payments", payments).await?;

    let reports: Vec<Value> = (0..args.reports)
        .map(|_| {
            json!({
                "Person_ID": faker.pick(&person_ids),
                "Date_Report_Sent": faker.datetime_this_year(),
                "Report_Text": faker.text(500),
            })
        })
        .collect();
    report.monthly_reports = insert_each(engine, "monthly_reports", reports).await?;

    Ok(report)
}

pub async fn handle(args: SeedArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = super::connect().await?;
    let engine = CrudEngine::new(&store);
    let mut faker = Faker::new(args.seed);

    let result = seed(&engine, &args, &mut faker).await;
    store.close().await;
    let report = result?;

    output_success(&output_format, "Seed data inserted", Some(serde_json::to_value(&report)?))
}
