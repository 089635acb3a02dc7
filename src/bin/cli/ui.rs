use clap::ValueEnum;
use graphload::ddl::drop_statement;
use graphload::exec::RetryOutcome;
use graphload::ingest::{
    IngestSummary, IngestionPlan, PhaseKind, PlanStep, ProgressSink, StatementKind, TableSource,
};
use graphload::TableKind;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Role of a rendered fragment; selects its colour.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tone {
    Heading,
    Label,
    Drop,
    Create,
    Load,
    Muted,
    Ok,
    Warn,
}

impl From<StatementKind> for Tone {
    fn from(kind: StatementKind) -> Self {
        match kind {
            StatementKind::CreateNode | StatementKind::CreateRelationship => Tone::Create,
            StatementKind::BulkLoad => Tone::Load,
        }
    }
}

/// Renders schemas, plans and load summaries for a terminal.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let paint = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        Self {
            palette: Palette::for_theme(theme),
            paint,
            quiet,
        }
    }

    pub fn schema(&self, tables: &[TableSource]) {
        if tables.is_empty() {
            self.warn("no tables found");
            return;
        }
        for table in tables {
            let desc = &table.descriptor;
            let kind = match desc.kind {
                TableKind::Node => "node",
                TableKind::Relationship if desc.is_group() => "relationship group",
                TableKind::Relationship => "relationship",
            };
            self.heading(format_args!("{} ({kind})", desc.name));
            self.field("location", table.location.display());
            if let Some(pk) = &desc.primary_key {
                self.field("primary key", pk);
            }
            for pair in &desc.endpoint_pairs {
                self.field("endpoints", format_args!("{} -> {}", pair.from, pair.to));
            }
            for col in &desc.columns {
                println!(
                    "    {} {} {}",
                    col.name,
                    self.paint(Tone::Create, &col.target),
                    self.paint(Tone::Muted, format_args!("({})", col.physical))
                );
            }
        }
    }

    /// Prints teardown and both phases, one statement per line.
    pub fn plan(&self, plan: &IngestionPlan) {
        if plan.teardown.is_empty() && plan.is_empty() {
            self.warn("no tables found");
            return;
        }
        if !plan.teardown.is_empty() {
            self.heading("teardown");
            for table in &plan.teardown {
                self.statement(None, Tone::Drop, &drop_statement(table));
            }
        }
        for phase in plan.phases() {
            self.heading(format_args!("{} ({} statements)", phase.kind, phase.steps.len()));
            for step in &phase.steps {
                self.statement(Some(step.sequence), step.kind.into(), &step.statement);
            }
        }
    }

    pub fn summary(&self, summary: &IngestSummary, elapsed: Duration) {
        self.heading("ingest");
        self.field("dropped", summary.tables_dropped);
        self.field("created", summary.tables_created);
        self.field("loaded", summary.loads_completed);
        self.field("skipped", self.flag_nonzero(summary.loads_skipped as u64));
        self.field("retries", self.flag_nonzero(summary.retries));
        self.done(format_args!("finished in {}", elapsed_text(elapsed)));
    }

    pub fn done(&self, message: impl Display) {
        if self.quiet {
            println!("{message}");
        } else {
            println!("{} {message}", self.paint(Tone::Ok, "ok"));
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.quiet {
            eprintln!("{message}");
        } else {
            eprintln!("{} {message}", self.paint(Tone::Warn, "warning:"));
        }
    }

    /// Starts the per-phase progress bar for a load run.
    pub fn load_progress(&self, label: impl Into<String>) -> LoadProgress<'_> {
        let label = label.into();
        let bar = (!self.quiet).then(|| {
            let style = ProgressStyle::with_template("{prefix:>8} [{bar:32}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            let bar = ProgressBar::new(0).with_style(style);
            bar.set_prefix("teardown");
            bar.set_message(label.clone());
            bar
        });
        LoadProgress {
            ui: self,
            label,
            current: None,
            started: Instant::now(),
            finished: false,
            bar,
        }
    }

    fn heading(&self, title: impl Display) {
        if self.quiet {
            println!("{title}");
        } else {
            println!("{}", self.paint(Tone::Heading, format_args!("[{title}]")));
        }
    }

    fn field(&self, label: &str, value: impl Display) {
        println!("  {} {value}", self.paint(Tone::Label, format_args!("{label:>11}:")));
    }

    fn statement(&self, sequence: Option<usize>, tone: Tone, text: &str) {
        let sequence = sequence.map_or_else(|| "  -".to_string(), |seq| format!("{seq:>3}"));
        println!("  {} {}", self.paint(Tone::Muted, sequence), self.paint(tone, text));
    }

    fn flag_nonzero(&self, count: u64) -> String {
        if count > 0 {
            self.paint(Tone::Warn, count)
        } else {
            count.to_string()
        }
    }

    fn paint(&self, tone: Tone, text: impl Display) -> String {
        if self.paint {
            self.palette.style(tone).paint(text.to_string()).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Progress of one load run; the bar restarts at every phase.
pub struct LoadProgress<'a> {
    ui: &'a Ui,
    label: String,
    current: Option<String>,
    started: Instant,
    finished: bool,
    bar: Option<ProgressBar>,
}

impl LoadProgress<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.started.elapsed()
    }

    fn warn(&self, message: String) {
        match &self.bar {
            Some(bar) => bar.suspend(|| self.ui.warn(&message)),
            None => self.ui.warn(&message),
        }
    }
}

impl ProgressSink for LoadProgress<'_> {
    fn table_dropped(&mut self, table: &str, dropped: bool) {
        if let Some(bar) = &self.bar {
            let state = if dropped { "dropped" } else { "absent" };
            bar.set_message(format!("{table} {state}"));
            bar.tick();
        }
    }

    fn phase_started(&mut self, phase: PhaseKind, steps: usize) {
        if let Some(bar) = &self.bar {
            bar.set_prefix(phase.to_string());
            bar.set_length(steps as u64);
            bar.set_position(0);
        }
    }

    fn step_started(&mut self, step: &PlanStep) {
        self.current = Some(step.target.clone());
        if let Some(bar) = &self.bar {
            let message = match &step.progress {
                Some(progress) => format!("COPY {} ({progress})", step.target),
                None => format!("CREATE {}", step.table),
            };
            bar.set_message(message);
        }
    }

    fn step_finished(&mut self, step: &PlanStep, outcome: &RetryOutcome) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        match outcome {
            RetryOutcome::SkippedDuplicate(_) if step.kind == StatementKind::BulkLoad => {
                self.warn(format!("{} was already loaded; skipped", step.target))
            }
            RetryOutcome::Succeeded { attempts } if *attempts > 1 => self.warn(format!(
                "{} loaded after {attempts} attempts",
                step.target
            )),
            _ => {}
        }
    }
}

impl Drop for LoadProgress<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let at = self.current.as_deref().unwrap_or("teardown");
        let message = format!(
            "{} stopped at {at} after {}",
            self.label,
            elapsed_text(self.started.elapsed())
        );
        match self.bar.take() {
            Some(bar) => bar.abandon_with_message(message),
            None => self.ui.warn(message),
        }
    }
}

pub fn elapsed_text(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0 => format!("{}ms", duration.as_millis()),
        1..=59 => format!("{:.1}s", duration.as_secs_f64()),
        _ => format!("{}m{:02}s", secs / 60, secs % 60),
    }
}

#[derive(Default)]
struct Palette {
    heading: Style,
    label: Style,
    drop: Style,
    create: Style,
    load: Style,
    muted: Style,
    ok: Style,
    warn: Style,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Plain => Self::default(),
            Theme::Light => Self::with_colors(Color::Blue, Color::Red, Color::Green, Color::Purple, Color::DarkGray),
            Theme::Dark | Theme::Auto => Self::with_colors(
                Color::LightPurple,
                Color::LightRed,
                Color::LightGreen,
                Color::LightCyan,
                Color::LightGray,
            ),
        }
    }

    fn with_colors(heading: Color, drop: Color, create: Color, load: Color, muted: Color) -> Self {
        Self {
            heading: heading.bold(),
            label: Style::new().bold(),
            drop: drop.normal(),
            create: create.normal(),
            load: load.normal(),
            muted: muted.normal(),
            ok: create.bold(),
            warn: Color::Yellow.bold(),
        }
    }

    fn style(&self, tone: Tone) -> Style {
        match tone {
            Tone::Heading => self.heading,
            Tone::Label => self.label,
            Tone::Drop => self.drop,
            Tone::Create => self.create,
            Tone::Load => self.load,
            Tone::Muted => self.muted,
            Tone::Ok => self.ok,
            Tone::Warn => self.warn,
        }
    }
}
