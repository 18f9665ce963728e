mod api;
mod app;
mod config;
mod detail;
mod dom;
mod error;
mod favorites;
mod filters;
mod lists;
mod model;
mod navigation;
mod pages;
mod render;
mod search;
mod ui;

use api::{Api, DiscoverCategory};
use app::{App, DetailTab, InputMode, View};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Config;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use filters::{FilterOptions, FilterSelection};
use indicatif::{ProgressBar, ProgressStyle};
use model::FavoriteKey;
use navigation::{FileStorage, NavigationMemory};
use pages::PageContext;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Browse trending, popular and curated movies and TV shows
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the movie API (overrides config and MOVIE_EXPLORER_API)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Path to a config.json file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse in the terminal UI (default)
    Browse,
    /// Render the home page as HTML
    Home {
        /// Arriving through a detail page's back link
        #[arg(long)]
        back: bool,
        #[command(flatten)]
        filters: FilterArgs,
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search movies and TV shows
    Search { query: String },
    /// Render a movie's detail page
    Movie {
        id: u64,
        /// Open the trailer modal
        #[arg(long)]
        trailer: bool,
    },
    /// Render a TV show's detail page
    Tv { id: u64 },
    /// Render the favorites page
    Favorites {
        /// Remove the favorite with this card id first
        #[arg(long)]
        remove: Option<String>,
    },
    /// Add or remove a favorite, e.g. `movie:550`
    Toggle { key: FavoriteKey },
    /// Follow a card on the home page, remembering the position
    Open {
        card_id: String,
        /// Current scroll offset
        #[arg(long, default_value_t = 0)]
        scroll: u64,
        /// Search first so search cards can be opened
        #[arg(long)]
        query: Option<String>,
    },
    /// List the available filter options
    Filters,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterTarget {
    Popular,
    TopRated,
}

impl From<FilterTarget> for DiscoverCategory {
    fn from(target: FilterTarget) -> Self {
        match target {
            FilterTarget::Popular => DiscoverCategory::Popular,
            FilterTarget::TopRated => DiscoverCategory::TopRated,
        }
    }
}

#[derive(Args)]
struct FilterArgs {
    /// Genre ids, comma separated
    #[arg(long = "genre", value_delimiter = ',')]
    genres: Vec<u32>,
    /// ISO 639-1 language codes
    #[arg(long = "language", value_delimiter = ',')]
    languages: Vec<String>,
    /// ISO 3166-1 region codes
    #[arg(long = "region", value_delimiter = ',')]
    regions: Vec<String>,
    #[arg(long)]
    year: Option<String>,
    /// Section the filters apply to
    #[arg(long, value_enum, default_value = "popular")]
    filter: FilterTarget,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection {
            genres: self.genres.clone(),
            languages: self.languages.clone(),
            regions: self.regions.clone(),
            year: self.year.clone(),
        }
    }
}

fn load_config(cli: &Cli) -> error::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?.with_env_overrides(),
        None => Config::load()?,
    };
    if let Some(api) = &cli.api {
        config.api_base_url = api.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Log to stderr for one-shot commands; the terminal UI owns the screen,
/// so it logs to a file in the cache dir.
fn init_tracing(tui: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if tui {
        let path = Config::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

/// Run `work` behind a stderr spinner.
async fn with_spinner<T>(message: &str, work: impl Future<Output = T>) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let result = work.await;
    pb.finish_and_clear();
    result
}

fn emit(html: &str, output: Option<&PathBuf>) -> error::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, html)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", html),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Commands::Browse);
    init_tracing(matches!(command, Commands::Browse))?;

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };
    let ctx = PageContext::new(Api::http(&config)?, config);

    let result = match command {
        Commands::Browse => run_browser(ctx).await,
        other => run_command(&ctx, &other).await.map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command(ctx: &PageContext, command: &Commands) -> error::Result<()> {
    match command {
        Commands::Browse => Ok(()),
        Commands::Home {
            back,
            filters: filter_args,
            output,
        } => {
            let mut session = FileStorage::open(&ctx.config.session_path()?)?;
            if *back {
                NavigationMemory::set_restore_to_top(&mut session, false)?;
            }
            let document = dom::shared(pages::home_document());
            let report = with_spinner("Loading lists...", pages::load_home(ctx, &document)).await;
            for container in &report.failed {
                eprintln!("Warning: could not load {}", container);
            }

            let selection = filter_args.selection();
            if selection != FilterSelection::default() {
                let fetcher = ctx.fetcher();
                filters::apply(&fetcher, &document, filter_args.filter.into(), &selection).await?;
            }

            let mut doc = dom::lock(&document);
            let restored = NavigationMemory::restore(&mut session, &mut doc)?;
            if let Some(y) = restored.scrolled_to {
                eprintln!("Restored scroll position {}", y);
            }
            emit(&doc.to_html(), output.as_ref())
        }
        Commands::Search { query } => {
            let document = dom::shared(pages::home_document());
            if let Err(e) = ctx.store.load(&ctx.api).await {
                tracing::warn!(error = %e, "Favorites unavailable");
            }
            let controller = ctx.search(document.clone());
            let outcome = with_spinner("Searching...", controller.run(query)).await;
            tracing::debug!(?outcome, "Search finished");
            let doc = dom::lock(&document);
            let html = doc
                .container(search::RESULTS_CONTAINER)
                .map(|c| c.children.iter().map(render::node_html).collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();
            emit(&html, None)
        }
        Commands::Movie { id, trailer } => {
            let key = FavoriteKey::new(model::MediaType::Movie, *id);
            let document = dom::shared(detail::movie_document());
            let report = with_spinner("Loading movie...", pages::load_detail(ctx, &document, key)).await?;
            for part in report.failures(key.media_type) {
                eprintln!("Warning: could not load {}", part);
            }
            let mut doc = dom::lock(&document);
            if *trailer && !detail::play_trailer(&mut doc) {
                eprintln!("No trailer available");
            }
            emit(&doc.to_html(), None)
        }
        Commands::Tv { id } => {
            let key = FavoriteKey::new(model::MediaType::Tv, *id);
            let document = dom::shared(detail::tv_document());
            let report = with_spinner("Loading show...", pages::load_detail(ctx, &document, key)).await?;
            for part in report.failures(key.media_type) {
                eprintln!("Warning: could not load {}", part);
            }
            emit(&dom::lock(&document).to_html(), None)
        }
        Commands::Favorites { remove } => {
            let document = dom::shared(pages::favorites_document());
            with_spinner("Loading favorites...", pages::load_favorites_page(ctx, &document)).await?;
            if let Some(card_id) = remove {
                pages::remove_favorite_card(ctx, &document, card_id).await?;
            }
            emit(&dom::lock(&document).to_html(), None)
        }
        Commands::Toggle { key } => {
            ctx.store.load(&ctx.api).await?;
            let on = ctx.store.toggle(&ctx.api, *key).await?;
            println!("{} {}", render::heart_glyph(on), key);
            Ok(())
        }
        Commands::Open { card_id, scroll, query } => {
            let mut session = FileStorage::open(&ctx.config.session_path()?)?;
            let document = dom::shared(pages::home_document());
            with_spinner("Loading lists...", pages::load_home(ctx, &document)).await;
            if let Some(query) = query {
                ctx.search(document.clone()).run(query).await;
            }
            let mut doc = dom::lock(&document);
            doc.scroll_to(*scroll);
            let href = pages::click_card(&mut session, &doc, card_id)?;
            println!("{}", href);
            Ok(())
        }
        Commands::Filters => {
            let options = FilterOptions::load(&ctx.api).await;
            for (title, list) in [
                ("Genres", &options.genres),
                ("Languages", &options.languages),
                ("Regions", &options.regions),
            ] {
                println!("{}:", title);
                for option in list {
                    println!("  {:<6} {}", option.value, option.label);
                }
            }
            Ok(())
        }
    }
}

async fn run_browser(ctx: PageContext) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(ctx);
    app.init().await;

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    app.update_page_size(size.height);

    let result = run_app(&mut terminal, &mut app).await;

    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout so background search
        // results get drawn
        if crossterm::event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key).await;
                }
                Event::Resize(_, height) => {
                    app.update_page_size(height);
                }
                _ => {}
            }
        }
    }
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('?') && app.input_mode == InputMode::Normal {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
        return;
    }
    match app.view {
        View::Home => handle_home_key(app, key).await,
        View::Detail => handle_detail_key(app, key).await,
        View::Favorites => handle_favorites_key(app, key).await,
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.query.pop();
            app.search_changed();
        }
        KeyCode::Char(c) => {
            app.query.push(c);
            app.search_changed();
        }
        _ => {}
    }
}

async fn handle_home_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::PageDown => app.list_page_down(),
        KeyCode::PageUp => app.list_page_up(),
        KeyCode::Char('g') => app.selected = 0,
        KeyCode::Enter => app.open_selected().await,
        KeyCode::Char('f') => app.toggle_favorite().await,
        KeyCode::Char('v') => app.show_favorites().await,
        KeyCode::Char('r') => app.init().await,
        KeyCode::Esc => {
            if !app.query.is_empty() {
                app.clear_search();
            }
        }
        _ => {}
    }
}

async fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            if !app.close_trailer() {
                app.close_detail().await;
            }
        }
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.detail_tab = app.detail_tab.next();
            app.detail_scroll = 0;
        }
        KeyCode::Char('1') => {
            app.detail_tab = DetailTab::Info;
            app.detail_scroll = 0;
        }
        KeyCode::Char('2') => {
            app.detail_tab = DetailTab::Cast;
            app.detail_scroll = 0;
        }
        KeyCode::Char('f') => app.toggle_favorite().await,
        KeyCode::Char('t') => app.play_trailer(),
        KeyCode::Char('o') => {
            if let Some(url) = app.trailer_url() {
                let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
                app.status_msg = format!("Opening: {}", url);
            }
        }
        _ => {}
    }
}

async fn handle_favorites_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.show_home(),
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::Enter => app.open_selected().await,
        KeyCode::Char('d') => app.toggle_favorite().await,
        _ => {}
    }
}
