mod ui;

use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokedex::action::Action;
use pokedex::catalog::Catalog;
use pokedex::config::CatalogConfig;
use pokedex::effect::Effect;
use pokedex::loader;
use pokedex::reducer::reducer;
use pokedex::search;
use pokedex::state::AppState;

const SEARCH_TASK: &str = "catalog_search";

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Incrementally loaded Pokemon catalog with search")]
struct Args {
    #[command(flatten)]
    catalog: CatalogConfig,

    /// Write logs to this file (filter with POKEDEX_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum PokedexComponentId {
    CatalogList,
    DetailTabs,
    Search,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum PokedexContext {
    CatalogList,
    DetailTabs,
    Search,
}

impl EventRoutingState<PokedexComponentId, PokedexContext> for AppState {
    fn focused(&self) -> Option<PokedexComponentId> {
        if self.search.active {
            Some(PokedexComponentId::Search)
        } else {
            Some(PokedexComponentId::CatalogList)
        }
    }

    fn modal(&self) -> Option<PokedexComponentId> {
        if self.search.active {
            Some(PokedexComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: PokedexComponentId) -> PokedexContext {
        match id {
            PokedexComponentId::CatalogList => PokedexContext::CatalogList,
            PokedexComponentId::DetailTabs => PokedexContext::DetailTabs,
            PokedexComponentId::Search => PokedexContext::Search,
        }
    }

    fn default_context(&self) -> PokedexContext {
        PokedexContext::CatalogList
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let env = std::env::var("POKEDEX_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_ref())?;
    let catalog = Catalog::from_config(args.catalog.clone())
        .map_err(|error| io::Error::other(format!("http client error: {error}")))?;
    let debug = DebugSession::new(args.debug);

    let batch_size = args.catalog.batch_size;
    let state = debug
        .load_state_or_else_async(|| async move { Ok::<AppState, io::Error>(AppState::new(batch_size)) })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, catalog.clone()).await;
    catalog.shutdown();

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    catalog: Catalog,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(ui::PokedexUi::new()));
    let mut bus: EventBus<AppState, Action, PokedexComponentId, PokedexContext> = EventBus::new();
    let keybindings: Keybindings<PokedexContext> = Keybindings::new();

    let ui_list = Rc::clone(&ui);
    bus.register(PokedexComponentId::CatalogList, move |event, state| {
        ui_list.borrow_mut().handle_list_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(PokedexComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) if !state.search.active => match key.code {
            crossterm::event::KeyCode::Char('q') => HandlerResponse::action(Action::Quit),
            crossterm::event::KeyCode::Char('/') => HandlerResponse::action(Action::SearchStart),
            crossterm::event::KeyCode::Esc if state.search.is_searching() => {
                HandlerResponse::action(Action::SearchCancel)
            }
            crossterm::event::KeyCode::Char('r') => HandlerResponse::action(Action::LoaderRetry),
            crossterm::event::KeyCode::Char('n') => {
                HandlerResponse::action(Action::LoaderFetchNext)
            }
            crossterm::event::KeyCode::Tab
            | crossterm::event::KeyCode::Right
            | crossterm::event::KeyCode::Char('l') => HandlerResponse::action(Action::DetailTabNext),
            crossterm::event::KeyCode::BackTab
            | crossterm::event::KeyCode::Left
            | crossterm::event::KeyCode::Char('h') => HandlerResponse::action(Action::DetailTabPrev),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(120), || Action::Tick);
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &catalog),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, catalog: &Catalog) {
    match effect {
        Effect::FetchBatch(request) => {
            let catalog = catalog.clone();
            ctx.tasks().spawn(TaskKey::new("loader_batch"), async move {
                let offset = request.offset;
                loader::batch_action(offset, catalog.fetch_batch(request).await)
            });
        }
        Effect::SearchCatalog { term } => {
            let cancel = catalog.begin_search();
            let catalog = catalog.clone();
            let debounce = catalog.config().search_debounce();
            ctx.tasks().debounce(SEARCH_TASK, debounce, async move {
                let result = catalog.search(&term, &cancel).await;
                search::search_action(term, result)
            });
        }
        Effect::CancelSearch => {
            ctx.tasks().cancel(&TaskKey::new(SEARCH_TASK));
            catalog.cancel_search();
        }
    }
}
