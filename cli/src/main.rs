use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, subscriber::set_global_default, warn};
use tracing_subscriber::EnvFilter;

use docmatch::codec::{read_dataset, save_dataset};
use docmatch::copy::{copy_collected_files, execute_pdf_copies, plan_pdf_copies};
use docmatch::merge::merge_csv_files;
use docmatch::search::{SearchSource, list_csv_files, search_titles, search_tree};
use docmatch::session::RowOrigin;
use docmatch::tagging::{
    add_final_name_column, add_folder_column, exist_stats, tag_file_number_existence,
    tag_title_existence,
};
use docmatch::{CopyReport, FileIndex, LocalFs, MatchConfig, NamedDataset, Session, TabularDataset};

fn init_tracing(verbosity: u8) {
    // -q/-v move one level each from INFO
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    let _ = set_global_default(subscriber);
}

fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose.saturating_add(1).saturating_sub(opts.quiet));
    smol::block_on(async move {
        if let Err(e) = run(opts).await {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    });
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MatchConfig> {
    let config = match path {
        Some(path) => MatchConfig::from_json_file(path)?,
        None => MatchConfig::load_default()?,
    };
    Ok(config)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_root(
    arg: Option<PathBuf>,
    fallback: Option<&PathBuf>,
    what: &str,
) -> anyhow::Result<PathBuf> {
    arg.or_else(|| fallback.cloned())
        .ok_or_else(|| anyhow::anyhow!("no {what} directory given and none configured"))
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let config = load_config(opts.config.as_deref())?;
    let provider = LocalFs::new();

    match opts.command {
        Command::Merge { first, second } => {
            let (first_name, second_name) = (display_name(&first), display_name(&second));
            let (outcome, target) = merge_csv_files(
                &provider,
                (first_name.as_str(), &first),
                (second_name.as_str(), &second),
                &config.columns.link,
            )
            .await?;
            println!(
                "{} rows added to {}",
                outcome.rows_added,
                target.display()
            );
        }
        Command::CheckTxt { file, root } => {
            let dataset = read_dataset(&provider, &file).await?;
            let index = FileIndex::scan(&root, ".txt", &config.temp_files)?;
            let report = tag_title_existence(&dataset, &index, &config)?;
            save_dataset(&provider, &file, &report.dataset).await?;
            println!(
                "{}/{} titles have a transcript",
                report.found, report.checked
            );
        }
        Command::Tag {
            file,
            pdf_root,
            folders,
            final_names,
        } => {
            let name = display_name(&file);
            let mut dataset = read_dataset(&provider, &file).await?;
            if folders {
                dataset = add_folder_column(NamedDataset::new(&name, &dataset), &config)?.dataset;
            }
            if let Some(root) = pdf_root.or_else(|| config.source_path.clone()) {
                let index = FileIndex::scan(&root, ".pdf", &config.temp_files)?;
                let report =
                    tag_file_number_existence(NamedDataset::new(&name, &dataset), &index, &config)?;
                println!("{}/{} identifiers found", report.found, report.checked);
                dataset = report.dataset;
            }
            if final_names {
                dataset =
                    add_final_name_column(NamedDataset::new(&name, &dataset), &config)?.dataset;
            }
            save_dataset(&provider, &file, &dataset).await?;
            print_stats(&dataset, &config);
        }
        Command::CopyPdf { file, source, dest } => {
            let source = resolve_root(source, config.source_path.as_ref(), "source")?;
            let dest = resolve_root(dest, config.destination_path.as_ref(), "destination")?;
            let name = display_name(&file);
            let dataset = read_dataset(&provider, &file).await?;
            let tasks = plan_pdf_copies(NamedDataset::new(&name, &dataset), &config)?;
            let index = FileIndex::scan(&source, ".pdf", &config.temp_files)?;
            let report = execute_pdf_copies(&tasks, &index, &dest, &config).await?;
            print_report(&report);
        }
        Command::Search { root, term } => {
            for hit in search_tree(&provider, &root, &term).await? {
                println!(
                    "{}/{} [{}]: {}",
                    hit.folder_path,
                    hit.file_name,
                    hit.row_index + 1,
                    hit.title
                );
            }
        }
        Command::Collect { root, term, dest } => {
            let session = collect(&provider, &root, &term).await?;
            println!("{}", session.joined_links());
            for file in session.files() {
                println!("  {} ({})", file.file_name, file.folder_path);
            }
            if let Some(dest) = dest {
                smol::fs::create_dir_all(&dest).await?;
                let report = copy_collected_files(&provider, session.files(), &root, &dest).await?;
                print_report(&report);
            }
        }
    }
    Ok(())
}

async fn collect(provider: &LocalFs, root: &PathBuf, term: &str) -> anyhow::Result<Session<PathBuf>> {
    let mut loaded = Vec::new();
    for entry in list_csv_files(provider, root, true).await? {
        match read_dataset(provider, &entry.file).await {
            Ok(dataset) => loaded.push((entry, dataset)),
            Err(e) => warn!("skipping {}: {e}", entry.file.display()),
        }
    }

    let sources: Vec<SearchSource<'_>> = loaded
        .iter()
        .map(|(entry, dataset)| SearchSource {
            folder_path: &entry.folder_path,
            file_name: &entry.file_name,
            dataset,
        })
        .collect();

    let hits = search_titles(&sources, term);

    let mut session = Session::new();
    for hit in &hits {
        let Some((entry, dataset)) = loaded
            .iter()
            .find(|(e, _)| e.folder_path == hit.folder_path && e.file_name == hit.file_name)
        else {
            continue;
        };
        let origin = RowOrigin::new(
            entry.folder_path.clone(),
            entry.file.parent().map(Path::to_path_buf),
        );
        let row = dataset.rows()[hit.row_index].as_slice();
        session.collect_row(dataset.headers(), row, None, &origin);
    }
    Ok(session)
}

fn print_stats(dataset: &TabularDataset, config: &MatchConfig) {
    let stats = exist_stats(dataset, config);
    println!(
        "Exist: {} found, {} missing, {} empty",
        stats.found, stats.missing, stats.empty
    );
}

fn print_report(report: &CopyReport) {
    println!("Copied: {}", report.copied.len());
    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.join(", "));
    }
    for failure in &report.failures {
        println!("  failed {}: {}", failure.item, failure.reason);
    }
}

#[derive(Parser)]
#[command(version, about = "Match spreadsheet rows to their TXT and PDF files")]
pub struct Opts {
    /// Increase verbosity (-v, -vv). Default INFO.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Decrease verbosity (-q). Each -q reduces level by one step.
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
    /// JSON configuration file; defaults to the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge two CSV files by link into the wider one
    Merge { first: PathBuf, second: PathBuf },
    /// Refresh the fileExist column of a CSV against TXT files under a root
    CheckTxt {
        file: PathBuf,
        #[arg(long)]
        root: PathBuf,
    },
    /// Add folder, existence and final-name columns to a file-number CSV
    Tag {
        file: PathBuf,
        /// Root of the PDF files; defaults to the configured source path
        #[arg(long)]
        pdf_root: Option<PathBuf>,
        #[arg(long)]
        folders: bool,
        #[arg(long)]
        final_names: bool,
    },
    /// Copy the PDFs of found rows into folder hierarchies
    CopyPdf {
        file: PathBuf,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Search the title columns of every CSV under a root
    Search { root: PathBuf, term: String },
    /// Collect links and transcripts of matching rows
    Collect {
        root: PathBuf,
        term: String,
        /// Copy the collected transcripts here
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}
