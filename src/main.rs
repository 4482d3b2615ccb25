use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use filmnotes::config::FilmNotesConfig;
use filmnotes::core::ReviewDraft;
use filmnotes::core::text::truncate_text;
use filmnotes::storage::{FileStore, KeyValueStore, MemoryStore, Persistence};
use filmnotes::store::AnnotationStore;
use filmnotes::submit::{submit_note, submit_review};
use filmnotes::validate::Violations;

const USAGE: &str = "usage: filmnotes [--ephemeral] <command>

commands:
  status
  favorite <film-id>            toggle a favorite
  favorites
  note <film-id> <text...>
  notes <film-id>
  delete-note <film-id> <timestamp>
  review <film-id> --rating N --title T --body B --mood M [--spoiler] [--watched YYYY-MM-DD]
  reviews <film-id>
  delete-review <film-id> <timestamp>
  dark-mode                     toggle dark mode";

#[derive(Debug, thiserror::Error)]
enum UsageError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Invalid(String),
    #[error("{usage}", usage = USAGE)]
    Missing,
}

fn invalid(msg: impl Into<String>) -> UsageError {
    UsageError::Invalid(msg.into())
}

fn init_logging(config: &FilmNotesConfig) {
    // Journal filter: this crate at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("filmnotes") {
                let max = if filmnotes::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    filmnotes::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("filmnotes".to_string()),
        Err(e) => {
            eprintln!("journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FilmNotesConfig::load(&FilmNotesConfig::default_path());
    init_logging(&config);

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let ephemeral = match args.iter().position(|a| a == "--ephemeral") {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    };

    if ephemeral {
        let persistence = Persistence::with_prefix(MemoryStore::new(), config.key_prefix.clone());
        run(AnnotationStore::open(persistence), &config, &args)
    } else {
        let backend = FileStore::new(config.storage_directory.clone());
        let persistence = Persistence::with_prefix(backend, config.key_prefix.clone());
        run(AnnotationStore::open(persistence), &config, &args)
    }
}

fn run<S: KeyValueStore>(
    mut store: AnnotationStore<S>,
    config: &FilmNotesConfig,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (command, rest) = args.split_first().ok_or(UsageError::Missing)?;

    match command.as_str() {
        "status" => {
            println!("favorites: {}", store.favorites().len());
            println!("notes:     {}", store.notes().len());
            println!("reviews:   {}", store.reviews().len());
            println!("dark mode: {}", on_off(store.dark_mode()));
        }
        "favorite" => {
            let film_id = film_arg(rest)?;
            if store.toggle_favorite(film_id) {
                println!("★ {} added to favorites", film_id);
            } else {
                println!("☆ {} removed from favorites", film_id);
            }
        }
        "favorites" => {
            for film_id in store.favorites() {
                println!("{}", film_id);
            }
        }
        "note" => {
            let film_id = film_arg(rest)?;
            let body = rest[1..].join(" ");
            match submit_note(&mut store, film_id, &body, config.note_min_length) {
                Ok(stamp) => println!("note added at {}", format_stamp(stamp)),
                Err(violations) => report(&violations),
            }
        }
        "notes" => {
            let film_id = film_arg(rest)?;
            for note in store.notes_for(film_id) {
                println!(
                    "{}  {}",
                    format_stamp(note.timestamp),
                    truncate_text(&note.note, config.preview_length)
                );
            }
        }
        "delete-note" => {
            let (film_id, stamp) = key_args(rest)?;
            if store.delete_note(film_id, stamp) {
                println!("note deleted");
            } else {
                println!("no matching note");
            }
        }
        "review" => {
            let draft = parse_review(rest)?;
            let today = chrono::Local::now().date_naive();
            match submit_review(&mut store, draft, today) {
                Ok(stamp) => println!("review added at {}", format_stamp(stamp)),
                Err(violations) => report(&violations),
            }
        }
        "reviews" => {
            let film_id = film_arg(rest)?;
            for review in store.reviews_for(film_id) {
                let spoiler = if review.is_spoiler { " [spoiler]" } else { "" };
                let watched = review
                    .date_watched
                    .map(|d| format!(", watched {}", d))
                    .unwrap_or_default();
                println!(
                    "{}  {} {}{} ({}{})",
                    format_stamp(review.timestamp),
                    review.stars(),
                    review.title,
                    spoiler,
                    review.mood,
                    watched
                );
                println!("    {}", truncate_text(&review.body, config.preview_length));
            }
        }
        "delete-review" => {
            let (film_id, stamp) = key_args(rest)?;
            if store.delete_review(film_id, stamp) {
                println!("review deleted");
            } else {
                println!("no matching review");
            }
        }
        "dark-mode" => {
            println!("dark mode {}", on_off(store.toggle_dark_mode()));
        }
        other => return Err(invalid(format!("unknown command: {}", other)).into()),
    }

    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn format_stamp(stamp: DateTime<Utc>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn report(violations: &Violations) {
    for violation in violations {
        eprintln!("  {}", violation);
    }
    std::process::exit(2);
}

fn film_arg(rest: &[String]) -> Result<&str, UsageError> {
    rest.first()
        .map(String::as_str)
        .ok_or_else(|| invalid("missing <film-id>"))
}

fn key_args(rest: &[String]) -> Result<(&str, DateTime<Utc>), UsageError> {
    let film_id = film_arg(rest)?;
    let raw = rest.get(1).ok_or_else(|| invalid("missing <timestamp>"))?;
    let stamp = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| invalid(format!("bad timestamp {:?}: {}", raw, e)))?
        .with_timezone(&Utc);
    Ok((film_id, stamp))
}

fn parse_review(rest: &[String]) -> Result<ReviewDraft, UsageError> {
    let mut draft = ReviewDraft::new(film_arg(rest)?);
    let mut iter = rest[1..].iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| invalid(format!("{} needs a value", flag)))
        };
        match flag.as_str() {
            "--rating" => {
                let raw = value()?;
                draft.rating = raw
                    .parse()
                    .map_err(|_| invalid(format!("bad rating {:?}", raw)))?;
            }
            "--title" => draft.title = value()?,
            "--body" => draft.body = value()?,
            "--mood" => draft.mood = value()?,
            "--watched" => {
                let raw = value()?;
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| invalid(format!("bad date {:?}, expected YYYY-MM-DD", raw)))?;
                draft.date_watched = Some(date);
            }
            "--spoiler" => draft.is_spoiler = true,
            other => return Err(invalid(format!("unknown review option: {}", other))),
        }
    }
    Ok(draft)
}
