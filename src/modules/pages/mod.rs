//! Server-rendered pages and static assets, mounted at the root.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, response::Html, routing::get, Router};
use shelf_db::{SharedStore, StoredBook};
use shelf_http::error::AppError;
use shelf_kernel::{settings::PagesSettings, InitCtx, Module};
use tower_http::services::ServeDir;

use crate::utils::html;

pub struct PagesModule {
    store: SharedStore,
    static_dir: PathBuf,
}

impl PagesModule {
    pub fn new(store: SharedStore, settings: &PagesSettings) -> Self {
        Self {
            store,
            static_dir: settings.static_dir.clone(),
        }
    }
}

#[async_trait]
impl Module for PagesModule {
    fn name(&self) -> &'static str {
        "pages"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if !self.static_dir.is_dir() {
            tracing::warn!(
                module = self.name(),
                static_dir = %self.static_dir.display(),
                "static asset directory not found; /css will answer 404"
            );
        }
        Ok(())
    }

    fn root_routes(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/books", get(book_table))
            .route("/authors", get(author_table))
            .route("/years", get(year_table))
            .route("/search", get(search_bar))
            .with_state(Arc::clone(&self.store))
            .nest_service("/css", ServeDir::new(&self.static_dir))
    }
}

async fn index() -> Html<String> {
    Html(html::page(
        "Book catalog",
        "<p>Browse the catalog by book, author or year of publication.</p>\n",
    ))
}

/// Filters the rendered rows in the browser as the user types.
const SEARCH_SCRIPT: &str = r##"<script>
document.getElementById("search").addEventListener("input", function (event) {
  var needle = event.target.value.toLowerCase();
  document.querySelectorAll("#results tbody tr").forEach(function (row) {
    row.hidden = row.textContent.toLowerCase().indexOf(needle) === -1;
  });
});
</script>
"##;

async fn search_bar(State(store): State<SharedStore>) -> Result<Html<String>, AppError> {
    let rows = stored_books(&store).await?.into_iter().map(|book| {
        vec![
            book.fields.name,
            book.fields.author,
            book.fields.isbn,
            book.fields.year.to_string(),
        ]
    });
    let table = html::table(&["Name", "Author", "ISBN", "Year"], rows);

    let body = format!(
        "<input type=\"search\" id=\"search\" placeholder=\"Title, author or ISBN\" autofocus>\n\
         <div id=\"results\">\n{table}</div>\n{SEARCH_SCRIPT}"
    );
    Ok(Html(html::page("Search", &body)))
}

async fn book_table(State(store): State<SharedStore>) -> Result<Html<String>, AppError> {
    let rows = stored_books(&store).await?.into_iter().map(|book| {
        vec![
            book.id.to_hex(),
            book.fields.name,
            book.fields.author,
            book.fields.isbn,
            book.fields.pages.to_string(),
        ]
    });
    let table = html::table(&["ID", "Name", "Author", "ISBN", "Pages"], rows);
    Ok(Html(html::page("Books", &table)))
}

async fn author_table(State(store): State<SharedStore>) -> Result<Html<String>, AppError> {
    let rows = stored_books(&store)
        .await?
        .into_iter()
        .map(|book| vec![book.id.to_hex(), book.fields.author]);
    let table = html::table(&["ID", "Author"], rows);
    Ok(Html(html::page("Authors", &table)))
}

async fn year_table(State(store): State<SharedStore>) -> Result<Html<String>, AppError> {
    let rows = stored_books(&store)
        .await?
        .into_iter()
        .map(|book| vec![book.id.to_hex(), book.fields.year.to_string()]);
    let table = html::table(&["ID", "Year"], rows);
    Ok(Html(html::page("Years", &table)))
}

async fn stored_books(store: &SharedStore) -> Result<Vec<StoredBook>, AppError> {
    store
        .list_all()
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::new(err).context("failed to list books")))
}

/// Create the pages module rendering from `store`
pub fn create_module(store: SharedStore, settings: &PagesSettings) -> Arc<dyn Module> {
    Arc::new(PagesModule::new(store, settings))
}
