use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classroom::analytics::calendar::{upcoming, AttendanceGrid, Month, MonthCalendar};
use classroom::analytics::filter::{
    AssignmentFilter, CategoryIs, GradeFilter, GradeLevelIs, SearchTerm, Selection, StatusIs,
    StudentFilter,
};
use classroom::analytics::stats::{
    category_counts, recent_attendance, recent_grades, student_summaries, ClassReport,
    DashboardStats, GradingScale,
};
use classroom::analytics::lookup::student_name;
use classroom::analytics::Roster;
use classroom::api::{self, ApiConfig};
use classroom::client::ClassroomClient;
use classroom::config::Settings;
use classroom::demo;
use classroom::db::Database;
use classroom::models::*;
use classroom::render;
use classroom::repository::{ClassroomStore, MemoryStore, RemoteStore};
use classroom::workspace::{Workspace, WriteError};

/// Rows shown in the recent-activity lists.
const RECENT_LIMIT: usize = 5;
/// Students shown in the attendance grid.
const GRID_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "classroom")]
#[command(about = "Class roster, grades, attendance and reports")]
struct Cli {
    /// Where class data is read from and written to
    #[arg(long, value_enum, global = true, default_value_t = Source::Remote)]
    source: Source,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// The table API at CLASSROOM_URL
    Remote,
    /// Built-in sample class held in memory
    Demo,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the table API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "17020")]
        port: u16,

        /// Load the sample class into an empty database
        #[arg(long)]
        seed: bool,
    },
    #[command(flatten)]
    View(ViewCommand),
}

/// Commands that load the class data from `--source` and print a view of it.
#[derive(Subcommand)]
enum ViewCommand {
    /// Headline numbers, recent activity and upcoming deadlines
    Dashboard,
    /// Class-wide and per-student statistics over all records
    Report,
    /// List students
    Students {
        /// Match name, email or grade level
        #[arg(short, long, default_value = "")]
        search: String,
        /// Grade level label, or "all"
        #[arg(short, long, default_value = "all")]
        grade: String,
        /// active, inactive, pending or "all"
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// List grades with percentages and letter grades
    Grades {
        /// Match student or assignment name
        #[arg(short, long, default_value = "")]
        search: String,
        /// Assignment category, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,
    },
    /// Month calendar of assignment due dates
    Calendar {
        /// Month as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
        /// Assignment category, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,
        /// Only list what is due on this day
        #[arg(short, long)]
        day: Option<NaiveDate>,
    },
    /// Month attendance grid
    Attendance {
        /// Month as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Add a student to the roster
    AddStudent {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Grade level label, e.g. "10th Grade"
        #[arg(long)]
        grade: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: NaiveDate,
        #[arg(long)]
        parent_contact: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Enter a score for a student on an assignment
    EnterGrade {
        #[arg(long)]
        student: i64,
        #[arg(long)]
        assignment: i64,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        comments: Option<String>,
    },
    /// Record a student's attendance
    MarkAttendance {
        #[arg(long)]
        student: i64,
        /// present, absent, late or excused
        #[arg(long, default_value = "present")]
        status: String,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Initialize tracing. Everything except `serve` prints its result to
/// stdout, so logs go to stderr.
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "classroom=info,tower_http=info".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(!serving);

    let settings = Settings::load();
    let today = Local::now().date_naive();

    let command = match cli.command {
        Commands::Serve { port, seed } => return serve(&settings, port, seed, today).await,
        Commands::View(command) => command,
    };

    match cli.source {
        Source::Remote => {
            let client = ClassroomClient::new(settings.api_url.clone(), settings.api_key.clone());
            run(RemoteStore::new(client), command, &settings, today).await
        }
        Source::Demo => {
            let store = MemoryStore::from_snapshot(demo::snapshot(today), settings.defaults.clone())
                .with_latency(Duration::from_millis(settings.demo_latency_ms))
                .with_today(today);
            run(store, command, &settings, today).await
        }
    }
}

async fn serve(settings: &Settings, port: u16, seed: bool, today: NaiveDate) -> anyhow::Result<()> {
    tracing::info!("Starting classroom server on port {}", port);

    let db = Database::open(settings.database_path()?)?.with_defaults(settings.defaults.clone());
    db.migrate()?;

    if seed && db.is_empty()? {
        db.import(&demo::snapshot(today))?;
    }

    let config = ApiConfig {
        api_key: settings.api_key.clone(),
    };
    if config.api_key.is_none() {
        tracing::warn!("CLASSROOM_API_KEY is not set; the API accepts unauthenticated requests");
    }
    let app = api::create_router_with_config(db, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Classroom server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run<S: ClassroomStore>(
    store: S,
    command: ViewCommand,
    settings: &Settings,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let mut workspace = Workspace::open(store)
        .await
        .context("Failed to load class data")?;

    match command {
        ViewCommand::Dashboard => {
            let data = workspace.snapshot();
            let stats = DashboardStats::compute(
                &data.students,
                &data.grades,
                &data.attendance,
                &data.assignments,
                today,
            );
            let roster = Roster::new(&data.students, &data.assignments);
            let due = upcoming(&data.assignments, today, settings.upcoming_limit);
            print!(
                "{}",
                render::render_dashboard(
                    &stats,
                    &roster,
                    &recent_grades(&data.grades, RECENT_LIMIT),
                    &recent_attendance(&data.attendance, RECENT_LIMIT),
                    &due,
                )
            );
        }
        ViewCommand::Report => {
            let data = workspace.snapshot();
            let report = ClassReport::compute(
                &data.students,
                &data.grades,
                &data.attendance,
                &data.assignments,
            );
            let summaries = student_summaries(&data.students, &data.grades, &data.attendance);
            print!(
                "{}",
                render::render_report(&report, &summaries, &category_counts(&data.assignments))
            );
        }
        ViewCommand::Students {
            search,
            grade,
            status,
        } => {
            let status = Selection::parse(&status, StudentStatus::from_str)
                .with_context(|| format!("Unknown student status: {}", status))?;
            let grade_level = Selection::parse(&grade, |g| Some(g.to_string()))
                .unwrap_or(Selection::All);
            let filter = StudentFilter {
                search: SearchTerm::new(&search),
                grade_level: GradeLevelIs(grade_level),
                status: StatusIs(status),
            };
            print!(
                "{}",
                render::render_students(&filter.apply(&workspace.snapshot().students))
            );
        }
        ViewCommand::Grades { search, category } => {
            let data = workspace.snapshot();
            let roster = Roster::new(&data.students, &data.assignments);
            let rows = roster.grade_rows(&data.grades);
            let filter = GradeFilter {
                search: SearchTerm::new(&search),
                category: category_filter(&category),
            };
            print!(
                "{}",
                render::render_grades(&filter.apply(&rows), &GradingScale::default())
            );
        }
        ViewCommand::Calendar {
            month,
            category,
            day,
        } => {
            let month = parse_month(month.as_deref(), today)?;
            let filter = AssignmentFilter {
                category: category_filter(&category),
                ..Default::default()
            };
            let visible = filter.apply(&workspace.snapshot().assignments);
            match day {
                Some(day) => {
                    let calendar = MonthCalendar::build(
                        Month::containing(day),
                        settings.week_start,
                        visible.iter().copied(),
                        today,
                    );
                    let items: Vec<String> = calendar
                        .items_on(day)
                        .iter()
                        .map(|a| format!("  {} ({})", a.name, a.category))
                        .collect();
                    println!("{}", day.format("%A, %B %-d, %Y"));
                    if items.is_empty() {
                        println!("  (nothing due)");
                    }
                    for item in items {
                        println!("{}", item);
                    }
                }
                None => {
                    let calendar = MonthCalendar::build(
                        month,
                        settings.week_start,
                        visible.iter().copied(),
                        today,
                    );
                    print!("{}", render::render_calendar(&calendar));
                    println!("\nUpcoming");
                    print!(
                        "{}",
                        render::render_upcoming(&upcoming(
                            visible.iter().copied(),
                            today,
                            settings.upcoming_limit
                        ))
                    );
                }
            }
        }
        ViewCommand::Attendance { month } => {
            let month = parse_month(month.as_deref(), today)?;
            let data = workspace.snapshot();
            let grid = AttendanceGrid::build(month, &data.students, &data.attendance, GRID_ROWS);
            print!("{}", render::render_attendance_grid(&grid));
        }
        ViewCommand::AddStudent {
            first_name,
            last_name,
            email,
            grade,
            date_of_birth,
            parent_contact,
            status,
        } => {
            let status = match status {
                Some(s) => Some(
                    StudentStatus::from_str(&s)
                        .with_context(|| format!("Unknown student status: {}", s))?,
                ),
                None => None,
            };
            let input = CreateStudentInput {
                first_name,
                last_name,
                email,
                grade,
                date_of_birth,
                parent_contact,
                notes: None,
                status,
            };
            let student = report_write(workspace.add_student(input).await)?;
            println!("Added {} (id {})", student.full_name(), student.id);
        }
        ViewCommand::EnterGrade {
            student,
            assignment,
            score,
            comments,
        } => {
            let input = CreateGradeInput {
                student_id: student,
                assignment_id: assignment,
                score,
                submitted_date: None,
                comments,
            };
            let grade = report_write(workspace.enter_grade(input).await)?;
            let data = workspace.snapshot();
            let roster = Roster::new(&data.students, &data.assignments);
            print!(
                "{}",
                render::render_grade_entry(&roster.grade_row(&grade), &GradingScale::default())
            );
        }
        ViewCommand::MarkAttendance {
            student,
            status,
            date,
            notes,
        } => {
            let status = AttendanceStatus::from_str(&status)
                .with_context(|| format!("Unknown attendance status: {}", status))?;
            // Same day the dashboard counts as today.
            let input = CreateAttendanceInput {
                student_id: student,
                date: Some(date.unwrap_or(today)),
                status: Some(status),
                notes,
            };
            let record = report_write(workspace.mark_attendance(input).await)?;
            let name = student_name(&workspace.snapshot().students, &record.student);
            println!(
                "Marked {} {} on {} (id {})",
                name,
                record.status.label(),
                record.date,
                record.id
            );
        }
    }

    Ok(())
}

fn category_filter(raw: &str) -> CategoryIs {
    CategoryIs(Selection::parse(raw, |c| Some(c.to_string())).unwrap_or(Selection::All))
}

fn parse_month(raw: Option<&str>, today: NaiveDate) -> anyhow::Result<Month> {
    match raw {
        Some(raw) => Month::parse(raw).with_context(|| format!("Invalid month (want YYYY-MM): {}", raw)),
        None => Ok(Month::containing(today)),
    }
}

/// Turn a failed write into a readable error, one line per invalid field.
fn report_write<T>(result: Result<T, WriteError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(WriteError::Invalid(errors)) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, message)| format!("  {}: {}", field, message))
                .collect();
            bail!("Not saved:\n{}", lines.join("\n"))
        }
        Err(e) => Err(e).context("Not saved"),
    }
}
