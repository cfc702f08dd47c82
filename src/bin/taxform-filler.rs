//! Tax Form Filler CLI tool
//!
//! A command-line tool for filling IRS PDF forms with synthetic data.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use glob::glob;
use lopdf::Document;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;

use taxform_filler::config::{default_tax_year, ServeConfig, DEFAULT_ADDR};
use taxform_filler::extract::{extract_fields, write_summary_csv, write_summary_json, DEFAULT_SUMMARY_FILE};
use taxform_filler::forms::FormKind;
use taxform_filler::pdf::{
    build_template, extract_metadata, fill_file, list_fields, save_to_bytes, FillOptions,
};
use taxform_filler::period::{parse_date_expression, parse_tax_period, resolve_date, TaxPeriod};
use taxform_filler::synth::SyntheticGenerator;
use taxform_filler::template::{fetch_template, load_template, TemplateSource};
use taxform_filler::workflow::{generate_into, GenerateOptions};

/// Tax Form Filler - Fill IRS PDF forms with synthetic data
#[derive(Parser)]
#[command(name = "taxform-filler")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Fill the current IRS Form 1040 with one synthetic record
    taxform-filler generate --form 1040

    # Ten reproducible Schedule D records for Q3 2024 from a local template
    taxform-filler generate --form 941d --template f941sd.pdf --period 2024-Q3 --count 10 --seed 7

    # Work offline against a generated template
    taxform-filler scaffold --form 1040 -o f1040-template.pdf
    taxform-filler generate --template f1040-template.pdf --open

    # Summarize the values in filled forms
    taxform-filler extract \"*-filled*.pdf\"

    # Start the web UI
    taxform-filler serve --form 1040 --addr 127.0.0.1:8080")]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic records and fill them into a template
    Generate {
        /// Form to generate: 1040 or 941-schedule-d
        #[arg(short, long, default_value = "1040", value_parser = parse_form_kind)]
        form: FormKind,

        /// Template PDF path or URL (default: the IRS download)
        #[arg(short, long, env = "TAXFORM_TEMPLATE")]
        template: Option<String>,

        /// Output PDF file path (numbered when --count > 1)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of filled documents to generate
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Seed for reproducible records
        #[arg(long, env = "TAXFORM_SEED")]
        seed: Option<u64>,

        /// Tax period, e.g. "2023" or "2024-Q3" (default: last year)
        #[arg(long)]
        period: Option<String>,

        /// Signature date (e.g., "today", "2024-04-15", "04/15/2024")
        #[arg(long)]
        date: Option<String>,

        /// Fail when a record key or field name is missing from the template
        #[arg(long)]
        strict: bool,

        /// Mark filled fields read-only
        #[arg(long)]
        lock: bool,

        /// Print the generated records as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Fill a template from a JSON object of field names and values
    Fill {
        /// Template PDF file
        template: PathBuf,

        /// JSON file mapping fully qualified field names to values ("-" for stdin)
        #[arg(long)]
        values: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Fail on unknown or read-only field names
        #[arg(long)]
        strict: bool,

        /// Mark filled fields read-only
        #[arg(long)]
        lock: bool,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// List the form fields of a PDF
    Fields {
        /// PDF file to inspect
        input: PathBuf,

        /// Print fields as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract filled values into a summary table
    Extract {
        /// Filled PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file (default: form_processing_results.csv, or stdout with --json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Download the blank IRS template for a form
    Fetch {
        /// Form to download: 1040 or 941-schedule-d
        #[arg(short, long, default_value = "1040", value_parser = parse_form_kind)]
        form: FormKind,

        /// Output PDF file path (default: <form>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write an offline fillable template with the expected field names
    Scaffold {
        /// Form to scaffold: 1040 or 941-schedule-d
        #[arg(short, long, default_value = "1040", value_parser = parse_form_kind)]
        form: FormKind,

        /// Output PDF file path (default: <form>-template.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the generate/download web UI
    Serve {
        /// Form to generate: 1040 or 941-schedule-d
        #[arg(short, long, default_value = "1040", value_parser = parse_form_kind)]
        form: FormKind,

        /// Template PDF path or URL (default: the IRS download)
        #[arg(short, long, env = "TAXFORM_TEMPLATE")]
        template: Option<String>,

        /// Address to listen on
        #[arg(long, env = "TAXFORM_ADDR", default_value = DEFAULT_ADDR)]
        addr: SocketAddr,

        /// Seed for reproducible records
        #[arg(long, env = "TAXFORM_SEED")]
        seed: Option<u64>,

        /// Tax period, e.g. "2023" or "2024-Q3" (default: last year)
        #[arg(long)]
        period: Option<String>,

        /// Signature date (e.g., "today", "2024-04-15")
        #[arg(long)]
        date: Option<String>,

        /// Mark filled fields read-only
        #[arg(long)]
        lock: bool,
    },
}

fn parse_form_kind(s: &str) -> Result<FormKind, String> {
    s.parse::<FormKind>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let result = match cli.command {
        Commands::Generate {
            form, template, output, count, seed, period, date, strict, lock, json, open,
        } => {
            cmd_generate(
                form, template, output, count, seed, period, date, strict, lock, json, open,
            )
            .await
        }
        Commands::Fill { template, values, output, strict, lock, open } => {
            cmd_fill(template, values, output, strict, lock, open)
        }
        Commands::Fields { input, json } => {
            cmd_fields(input, json)
        }
        Commands::Extract { inputs, output, json } => {
            cmd_extract(inputs, output, json)
        }
        Commands::Info { input } => {
            cmd_info(input)
        }
        Commands::Fetch { form, output } => {
            cmd_fetch(form, output).await
        }
        Commands::Scaffold { form, output } => {
            cmd_scaffold(form, output)
        }
        Commands::Serve { form, template, addr, seed, period, date, lock } => {
            cmd_serve(form, template, addr, seed, period, date, lock).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> anyhow::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

fn template_source(form: FormKind, template: Option<String>) -> anyhow::Result<TemplateSource> {
    match template {
        Some(location) => Ok(location.parse::<TemplateSource>()?),
        None => Ok(TemplateSource::default_for(form)),
    }
}

fn tax_period(period: Option<String>) -> anyhow::Result<TaxPeriod> {
    match period {
        Some(expr) => Ok(parse_tax_period(&expr)?),
        None => Ok(TaxPeriod::year(default_tax_year())),
    }
}

fn signature_date(date: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    match date {
        Some(expr) => Ok(resolve_date(&parse_date_expression(&expr)?)),
        None => Ok(None),
    }
}

/// `out.pdf` -> `out-003.pdf`
fn numbered_output(output: &Path, number: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "filled".to_string());
    output.with_file_name(format!("{}-{:03}.pdf", stem, number))
}

/// Generate records and fill them into a template
#[allow(clippy::too_many_arguments)]
async fn cmd_generate(
    form: FormKind,
    template: Option<String>,
    output: Option<PathBuf>,
    count: u32,
    seed: Option<u64>,
    period: Option<String>,
    date: Option<String>,
    strict: bool,
    lock: bool,
    json: bool,
    open: bool,
) -> anyhow::Result<()> {
    let source = template_source(form, template)?;
    let options = GenerateOptions {
        period: tax_period(period)?,
        signature_date: signature_date(date)?,
        fill: FillOptions { strict, lock_fields: lock },
    };
    let output = output.unwrap_or_else(|| PathBuf::from(form.default_output()));

    eprintln!("Loading template: {}", source);
    let bytes = load_template(&source).await?;
    let doc = Document::load_mem(&bytes).context("Failed to parse template")?;
    let fields = list_fields(&doc)?;

    let mut generator = match seed {
        Some(seed) => SyntheticGenerator::seeded(seed),
        None => SyntheticGenerator::from_os_rng(),
    };

    eprintln!("Generating {} {} record(s) for {}...", count, form.display_name(), options.period);
    let mut records = Vec::new();
    let mut last_output = output.clone();
    for number in 1..=count {
        let generated = generate_into(form, &doc, &fields, &mut generator, &options)?;
        let path = if count == 1 { output.clone() } else { numbered_output(&output, number) };
        std::fs::write(&path, &generated.pdf_bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        eprintln!("  {} -> {}", generated.record.summary(), path.display());
        if !generated.unresolved.is_empty() {
            eprintln!(
                "  Warning: {} keys not found in template: {}",
                generated.unresolved.len(),
                generated.unresolved.join(", ")
            );
        }
        records.push(generated.record);
        last_output = path;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    eprintln!("Wrote {} file(s)", count);

    if open {
        open_file(&last_output)?;
    }

    Ok(())
}

/// Convert a JSON value into the string written to a field
fn json_field_value(name: &str, value: &serde_json::Value) -> anyhow::Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Bool(true) => Ok("Yes".to_string()),
        serde_json::Value::Bool(false) => Ok("Off".to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        _ => bail!("Value for {} must be a string, number, or boolean", name),
    }
}

/// Fill a template from explicit field values
fn cmd_fill(
    template: PathBuf,
    values: PathBuf,
    output: PathBuf,
    strict: bool,
    lock: bool,
    open: bool,
) -> anyhow::Result<()> {
    let text = if values.as_os_str() == "-" {
        io::read_to_string(io::stdin())?
    } else {
        std::fs::read_to_string(&values)
            .with_context(|| format!("Failed to read {}", values.display()))?
    };
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&text).context("Values must be a JSON object")?;

    let assignments = map
        .iter()
        .map(|(name, value)| Ok((name.clone(), json_field_value(name, value)?)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    eprintln!("Filling {} fields...", assignments.len());
    let options = FillOptions { strict, lock_fields: lock };
    let report = fill_file(&template, &output, &assignments, &options)?;

    for name in &report.unknown {
        eprintln!("Warning: no field named {}", name);
    }
    for name in &report.read_only {
        eprintln!("Warning: skipped read-only field {}", name);
    }
    for name in &report.truncated {
        eprintln!("Warning: value truncated for {}", name);
    }

    eprintln!("Filled {} fields", report.filled.len());
    eprintln!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// List the form fields of a PDF
fn cmd_fields(input: PathBuf, json: bool) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let doc = Document::load(&input)?;
    let fields = list_fields(&doc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    for field in &fields {
        let mut line = format!("{:<8} {}", field.field_type.as_str(), field.full_name);
        if let Some(value) = field.value.as_deref().filter(|v| !v.is_empty()) {
            line.push_str(&format!(" = {:?}", value));
        }
        if field.is_read_only() {
            line.push_str(" [read-only]");
        }
        println!("{}", line);
        if let Some(tooltip) = &field.tooltip {
            println!("         {}", tooltip);
        }
    }
    eprintln!("{} fields", fields.len());

    Ok(())
}

/// Summarize filled values across PDFs
fn cmd_extract(inputs: Vec<String>, output: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;

    let mut rows = Vec::new();
    for path in &inputs {
        eprintln!("Processing form: {}", path.display());
        rows.extend(extract_fields(path)?);
    }

    match (json, output) {
        (true, None) => {
            let stdout = io::stdout();
            write_summary_json(&rows, stdout.lock())?;
        }
        (true, Some(path)) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_summary_json(&rows, file)?;
            eprintln!("Results saved to {}", path.display());
        }
        (false, output) => {
            let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_SUMMARY_FILE));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_summary_csv(&rows, file)?;
            eprintln!("Results saved to {}", path.display());
        }
    }

    eprintln!("{} values from {} file(s)", rows.len(), inputs.len());
    io::stdout().flush()?;
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if metadata.has_acroform {
        println!("Form fields: {} ({} filled)", metadata.field_count, metadata.filled_count);
    } else {
        println!("Form fields: none");
    }

    Ok(())
}

/// Download a blank IRS template
async fn cmd_fetch(form: FormKind, output: Option<PathBuf>) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", form.slug())));

    eprintln!("Downloading {} from {}...", form.display_name(), form.template_url());
    let size = fetch_template(form, &output).await?;
    eprintln!("Saved {} bytes to {}", size, output.display());

    Ok(())
}

/// Write an offline template
fn cmd_scaffold(form: FormKind, output: Option<PathBuf>) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}-template.pdf", form.slug())));

    let mut doc = build_template(form);
    let bytes = save_to_bytes(&mut doc)?;
    std::fs::write(&output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!(
        "Wrote {} template with {} fields: {}",
        form.display_name(),
        form.field_specs().len(),
        output.display()
    );
    Ok(())
}

/// Serve the web UI
async fn cmd_serve(
    form: FormKind,
    template: Option<String>,
    addr: SocketAddr,
    seed: Option<u64>,
    period: Option<String>,
    date: Option<String>,
    lock: bool,
) -> anyhow::Result<()> {
    let mut config = ServeConfig::new(form);
    config.addr = addr;
    config.template = template_source(form, template)?;
    config.period = tax_period(period)?;
    config.seed = seed;
    config.signature_date = signature_date(date)?;
    config.fill.lock_fields = lock;

    eprintln!("Loading template: {}", config.template);
    taxform_filler::web::serve(config).await?;
    Ok(())
}
