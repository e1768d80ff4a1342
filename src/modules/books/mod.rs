pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::delete, Router};
use serde_json::json;
use shelf_db::SharedStore;
use shelf_kernel::{InitCtx, Module};

/// JSON catalog API under `/api/books`
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = %ctx.settings.database.collection,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    /// The nested router answers `/api/books` but not its trailing-slash form.
    fn root_routes(&self) -> Router {
        Router::new().route(
            &format!("/api/{}/", self.name()),
            delete(routes::delete_without_id),
        )
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let confirmation = |text: &str| {
            json!({
                "description": "Confirmation",
                "content": {
                    "application/json": {
                        "schema": { "type": "string", "example": text }
                    }
                }
            })
        };
        let book_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every stored book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_body.clone(),
                        "responses": {
                            "200": {
                                "description": "Identifier of the new book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/CreatedBook" }
                                    }
                                }
                            },
                            "400": error("Malformed body"),
                            "409": error("A book with the same fields exists"),
                            "500": error("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Replace the fields of a book",
                        "tags": ["Books"],
                        "requestBody": book_body,
                        "responses": {
                            "200": confirmation(routes::UPDATED),
                            "400": error("Malformed body"),
                            "409": error("A book with the same fields exists"),
                            "422": error("Missing or malformed identifier")
                        }
                    },
                    "delete": {
                        "summary": "Delete without an identifier; removes nothing",
                        "tags": ["Books"],
                        "responses": {
                            "200": confirmation(routes::DELETED)
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": confirmation(routes::DELETED)
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "24 character hex identifier, empty or absent before creation"
                            },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" },
                            "pages": { "type": "integer", "minimum": 0 },
                            "year": { "type": "integer" }
                        },
                        "required": ["name", "author", "isbn", "pages", "year"]
                    },
                    "CreatedBook": {
                        "type": "object",
                        "properties": {
                            "ID": { "type": "string" }
                        },
                        "required": ["ID"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by `store`
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
