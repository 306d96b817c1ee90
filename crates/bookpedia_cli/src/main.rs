//! Terminal driver for the Bookpedia core.
//!
//! # Responsibility
//! - Wire the core exactly as a UI host would (config, logging, services,
//!   navigation graph, controllers).
//! - Offer a line-oriented session for manual smoke checks.

use bookpedia_core::{
    default_log_level, init_logging, AppConfig, AppServices, Book, BookGraph, DetailAction,
    DetailController, DetailState, SearchAction, SearchController, SearchState, StateObserver,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;

const ENV_DATA_DIR: &str = "BOOKPEDIA_DATA_DIR";
const ENV_LOG_DIR: &str = "BOOKPEDIA_LOG_DIR";
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

const HELP: &str = "commands:
  search <query>   run a search (empty query restores the last results)
  favorites        list favorite books
  tab <0|1>        switch between results (0) and favorites (1)
  open <n>         open entry n of the current tab
  fav              toggle favorite on the open book
  back             close the open book
  help             show this text
  quit             exit";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let data_dir = dir_from_env(ENV_DATA_DIR, "data");
    if let Err(err) = init_logging(default_log_level(), dir_from_env(ENV_LOG_DIR, "logs")) {
        eprintln!("warning: logging disabled: {err}");
    }
    if let Err(err) = std::fs::create_dir_all(&data_dir) {
        eprintln!("error: cannot create {}: {err}", data_dir.display());
        return ExitCode::FAILURE;
    }

    let services = match AppServices::open(config, &data_dir) {
        Ok(services) => services,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("event=cli_session module=cli status=start");
    println!("bookpedia {} (type `help`)", bookpedia_core::core_version());
    let mut session = Session::new(&services, Handle::current());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        };
        if !session.run(line.trim()).await {
            break;
        }
    }
    info!("event=cli_session module=cli status=ok");
    ExitCode::SUCCESS
}

/// Absolute directory from `key`, else `<temp>/bookpedia/<leaf>`.
fn dir_from_env(key: &str, leaf: &str) -> PathBuf {
    std::env::var_os(key)
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .unwrap_or_else(|| std::env::temp_dir().join("bookpedia").join(leaf))
}

struct Session {
    graph: BookGraph,
    search: SearchController,
    /// Held for the whole session so the search screen stays active.
    search_state: StateObserver<SearchState>,
    detail: Option<(DetailController, StateObserver<DetailState>)>,
    debounce: Duration,
}

impl Session {
    fn new(services: &AppServices, runtime: Handle) -> Self {
        let graph = services.book_graph(runtime);
        let search = graph.search_controller();
        let search_state = search.state();
        graph.navigate(graph.start_destination());
        Self {
            graph,
            search,
            search_state,
            detail: None,
            debounce: services.config.controller.search_debounce,
        }
    }

    /// Executes one command; returns false on `quit`.
    async fn run(&mut self, line: &str) -> bool {
        let (command, argument) = line
            .split_once(' ')
            .map_or((line, ""), |(command, rest)| (command, rest.trim()));

        match command {
            "" => {}
            "search" => self.search(argument).await,
            "favorites" => {
                self.search.on_action(SearchAction::OnTabSelected(1));
                print_books(&self.search.snapshot().favorite_books);
            }
            "tab" => match argument.parse::<usize>() {
                Ok(index @ 0..=1) => self.search.on_action(SearchAction::OnTabSelected(index)),
                _ => println!("tab expects 0 or 1"),
            },
            "open" => match argument.parse::<usize>() {
                Ok(index) => self.open(index).await,
                Err(_) => println!("open expects an entry number"),
            },
            "fav" => self.toggle_favorite().await,
            "back" => {
                self.detail = None;
                self.graph.back();
            }
            "help" => println!("{HELP}"),
            "quit" | "exit" => return false,
            other => println!("unknown command `{other}`; try `help`"),
        }
        true
    }

    async fn search(&mut self, query: &str) {
        self.search.on_action(SearchAction::OnTabSelected(0));
        self.search
            .on_action(SearchAction::OnSearchQueryChange(query.to_string()));

        tokio::time::sleep(self.debounce + SETTLE_MARGIN).await;
        let Some(state) = self.search_state.wait_for(|state| !state.is_loading).await else {
            return;
        };
        match state.error_message {
            Some(message) => println!("error: {message}"),
            None => print_books(&state.search_results),
        }
    }

    async fn open(&mut self, index: usize) {
        let snapshot = self.search.snapshot();
        let books = if snapshot.selected_tab_index == 1 {
            snapshot.favorite_books
        } else {
            snapshot.search_results
        };
        let Some(book) = index.checked_sub(1).and_then(|i| books.get(i)).cloned() else {
            println!("no entry {index}");
            return;
        };

        let route = self.graph.select_book(book);
        let Some(detail) = self.graph.detail_controller(&route) else {
            return;
        };
        let mut observer = detail.state();
        if let Some(state) = observer.wait_for(|state| !state.is_loading).await {
            if let Some(book) = &state.book {
                print_detail(book, state.is_favorite);
            }
        }
        self.detail = Some((detail, observer));
    }

    async fn toggle_favorite(&mut self) {
        let Some((detail, observer)) = &mut self.detail else {
            println!("no book is open");
            return;
        };
        let before = observer.current().is_favorite;
        detail.on_action(DetailAction::OnFavoriteClick);
        let after = observer.current().is_favorite;
        if before == after {
            println!("nothing to toggle");
            return;
        }
        tokio::time::sleep(SETTLE_MARGIN).await;
        let confirmed = observer.current().is_favorite;
        println!("favorite: {confirmed}");
    }
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("(no books)");
        return;
    }
    for (index, book) in books.iter().enumerate() {
        let authors = if book.authors.is_empty() {
            "unknown author".to_string()
        } else {
            book.authors.join(", ")
        };
        let year = book.first_publish_year.as_deref().unwrap_or("n/a");
        println!("{:>3}. {} ({authors}, {year})", index + 1, book.title);
    }
}

fn print_detail(book: &Book, is_favorite: bool) {
    println!("{} [{}]", book.title, if is_favorite { "favorite" } else { "not favorite" });
    if let Some(rating) = book.average_rating {
        println!("rating: {rating:.1} ({} ratings)", book.rating_count.unwrap_or(0));
    }
    if let Some(pages) = book.num_pages {
        println!("pages: {pages}");
    }
    if !book.languages.is_empty() {
        println!("languages: {}", book.languages.join(", "));
    }
    println!("{}", book.description.as_deref().unwrap_or("(no description)"));
}
