use clap::{Parser, Subcommand};
use officekit::cli;
use officekit::error::OfficeResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "officekit")]
#[command(about = "Excel import/export, Word templates and date helpers")]
#[command(long_about = "officekit - Office document helpers

COMMANDS:
  import        - Excel sheet to header → value rows (YAML/JSON)
  export        - YAML/JSON rows to Excel (.xlsx)
  fill          - Replace ${name} placeholders in a .docx template
  placeholders  - List the placeholders of a .docx template
  dates         - Print an inclusive day or month range

EXAMPLES:
  officekit import staff.xlsx -o staff.json
  officekit export data.yaml -o report.xlsx
  officekit fill letter.docx -v values.yaml -o out.docx
  officekit dates 2024-01-30 2024-02-02

Set RUST_LOG=debug to trace what each command does.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Import an Excel sheet as header → value rows.

The first row of each sheet is the header. Blank rows are skipped.
Cell values are read as text: dates as yyyy-MM-dd HH:mm:ss,
whole numbers without a fraction, booleans as TRUE/FALSE.

Without -o the rows are printed as YAML.
With -o the extension picks the format: .json or YAML otherwise.")]
    /// Import Excel rows as header → value maps
    Import {
        /// Path to .xlsx/.xls/.ods file
        input: PathBuf,

        /// Sheet indices to read (default: 0)
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<usize>,

        /// 0-based row indices to skip in every read sheet
        #[arg(long, value_delimiter = ',')]
        skip_rows: Vec<u32>,

        /// 0-based column indices to skip in every read sheet
        #[arg(long, value_delimiter = ',')]
        skip_columns: Vec<u32>,

        /// Output file (.json or .yaml)
        #[arg(short, long, env = "OFFICEKIT_IMPORT_OUTPUT")]
        output: Option<PathBuf>,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Export YAML/JSON rows to an Excel workbook.

INPUT FORMAT:
  sheets:
    - name: Staff
      hidden_columns: [2]
      rows:
        - [Name, Age, Internal id]
        - [Ann, 31, a-1]

Each sheet entry becomes a worksheet. Numbers, booleans and text keep
their type. Columns are sized to their widest value unless --no-autosize.")]
    /// Export YAML/JSON rows to Excel .xlsx
    Export {
        /// Path to the YAML or JSON data file
        input: PathBuf,

        /// Output Excel file path (.xlsx)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep default column widths
        #[arg(long, env = "OFFICEKIT_NO_AUTOSIZE")]
        no_autosize: bool,

        /// Show verbose export steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Fill a Word template.

Every ${name} in the document body, table cells included, is replaced
with the value of 'name' from the values file. Placeholders split over
several runs are merged first.

VALUES FORMAT:
  customer: Ann Lee                 # text
  total: 1200.5                     # scalars become text
  logo:                             # image, size in points
    image: logo.png
    width: 120
    height: 40
  items:                            # table, first row bold
    table:
      - [Item, Qty]
      - [Pen, 2]

Image paths are relative to the values file.")]
    /// Replace ${name} placeholders in a .docx template
    Fill {
        /// Path to the .docx template
        template: PathBuf,

        /// YAML file of placeholder values
        #[arg(short, long, env = "OFFICEKIT_VALUES")]
        values: PathBuf,

        /// Output .docx path
        #[arg(short, long)]
        output: PathBuf,

        /// Show each replaced placeholder
        #[arg(long)]
        verbose: bool,
    },

    /// List the ${name} placeholders of a .docx template
    Placeholders {
        /// Path to the .docx template
        template: PathBuf,
    },

    /// Print every day (or month) from start to end, inclusive
    Dates {
        /// First date, e.g. 2024-01-30
        start: String,

        /// Last date
        end: String,

        /// Step by month and print yyyy-MM
        #[arg(short, long)]
        monthly: bool,
    },
}

fn main() -> OfficeResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            input,
            sheets,
            skip_rows,
            skip_columns,
            output,
            verbose,
        } => cli::import(input, sheets, skip_rows, skip_columns, output, verbose),

        Commands::Export {
            input,
            output,
            no_autosize,
            verbose,
        } => cli::export(input, output, !no_autosize, verbose),

        Commands::Fill {
            template,
            values,
            output,
            verbose,
        } => cli::fill(template, values, output, verbose),

        Commands::Placeholders { template } => cli::placeholders(template),

        Commands::Dates {
            start,
            end,
            monthly,
        } => cli::dates(start, end, monthly),
    }
}
