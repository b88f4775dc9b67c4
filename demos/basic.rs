//! Minimal structhttp example: an in-memory todo list served from its methods.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -X POST http://localhost:3000/Add -d '{"title":"write docs"}'
//!   curl -X POST http://localhost:3000/List
//!   curl http://localhost:3000/todo/1
//!   curl -X POST http://localhost:3000/Done -d 1
//!   curl -X POST http://localhost:3000/Clear

use std::sync::{Arc, Mutex, PoisonError};

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use structhttp::{
    Argument, Context, Data, DataShape, DefaultMatcher, Error, Expose, Handler, Json, Match, Matcher, Methods,
    Request, Server,
};
use tracing::info;

#[derive(Clone, Serialize)]
struct Todo {
    id: u64,
    title: String,
    done: bool,
}

#[derive(Deserialize)]
struct NewTodo {
    title: String,
}

#[derive(Default)]
struct Todos {
    items: Mutex<Vec<Todo>>,
}

impl Todos {
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Todo>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // POST /Add  {"title":"..."}  →  200 with the new todo
    fn add(&self, ctx: Context, new: Data<NewTodo>) -> Result<Json<Todo>, Error> {
        if new.title.trim().is_empty() {
            return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "title is empty"));
        }
        let mut items = self.lock();
        let todo = Todo { id: items.len() as u64 + 1, title: new.into_inner().title, done: false };
        items.push(todo.clone());
        info!(request_id = %ctx.request_id(), id = todo.id, "todo added");
        Ok(Json(todo))
    }

    // POST /List
    fn list(&self) -> Json<Vec<Todo>> {
        Json(self.lock().clone())
    }

    // GET /todo/{id}, routed by `todo_matcher`
    fn get_todo(&self, id: Data<u64>) -> Result<Json<Todo>, Error> {
        self.lock()
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .map(Json)
            .ok_or_else(|| Error::not_found(format!("no todo {}", *id)))
    }

    // POST /Done  1
    fn done(&self, id: Data<u64>) -> Result<(), Error> {
        match self.lock().iter_mut().find(|t| t.id == *id) {
            Some(todo) => {
                todo.done = true;
                Ok(())
            }
            None => Err(Error::not_found(format!("no todo {}", *id))),
        }
    }

    // POST /Clear  →  204
    fn clear(&self) {
        self.lock().clear();
    }

    // Returns two values, so it is never exposed.
    fn stats(&self) -> (Json<usize>, Json<usize>) {
        let items = self.lock();
        (Json(items.len()), Json(items.iter().filter(|t| t.done).count()))
    }
}

impl Expose for Todos {
    fn expose(methods: &mut Methods<Self>) {
        methods
            .add("Add", Todos::add)
            .add("List", Todos::list)
            .add("GetTodo", Todos::get_todo)
            .add("Done", Todos::done)
            .add("Clear", Todos::clear)
            .add("Stats", Todos::stats);
    }
}

/// `GET /todo/{id}` goes to `GetTodo`; everything else keeps the default
/// `POST /<Method>` convention.
fn todo_matcher(req: &Request, method: &str, extra: &[DataShape]) -> Match {
    if method != "GetTodo" {
        return DefaultMatcher.matches(req, method, extra);
    }
    if req.method() != Method::GET {
        return Match::NoMatch;
    }
    match req.path().strip_prefix("/todo/").map(str::parse::<u64>) {
        Some(Ok(id)) => Match::Matched(vec![Argument::new(id)]),
        Some(Err(e)) => Match::Rejected(Error::bad_request(format!("bad todo id: {e}")).into()),
        None => Match::NoMatch,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let todos = Arc::new(Todos::default());
    let handler = Handler::builder(todos).matcher(todo_matcher).build();

    Server::bind("0.0.0.0:3000")
        .serve(handler)
        .await
        .expect("server error");
}
