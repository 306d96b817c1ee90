//! Scripted in-memory repository shared by controller tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bookpedia_core::repo::BookStream;
use bookpedia_core::{Book, BookRepository, DataError, EmptyResult, LocalError, RemoteError};
use futures_util::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        image_url: format!("https://covers.example.org/b/id/{id}-L.jpg"),
        authors: vec!["Frank Herbert".to_string()],
        description: None,
        languages: vec!["eng".to_string()],
        first_publish_year: Some("1965".to_string()),
        average_rating: None,
        rating_count: None,
        num_pages: None,
        num_editions: 1,
    }
}

pub struct FakeBookRepository {
    search_results: Mutex<HashMap<String, Result<Vec<Book>, RemoteError>>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    search_calls: Mutex<Vec<String>>,
    description: Mutex<Result<Option<String>, DataError>>,
    description_delay: Mutex<Duration>,
    pub description_calls: AtomicUsize,
    favorites: watch::Sender<Vec<Book>>,
    pub favorite_subscriptions: AtomicUsize,
    write_delay: Mutex<Duration>,
    write_failure: Mutex<Option<LocalError>>,
    pub mark_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl Default for FakeBookRepository {
    fn default() -> Self {
        let (favorites, _) = watch::channel(Vec::new());
        Self {
            search_results: Mutex::default(),
            search_delays: Mutex::default(),
            search_calls: Mutex::default(),
            description: Mutex::new(Ok(None)),
            description_delay: Mutex::default(),
            description_calls: AtomicUsize::new(0),
            favorites,
            favorite_subscriptions: AtomicUsize::new(0),
            write_delay: Mutex::default(),
            write_failure: Mutex::default(),
            mark_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeBookRepository {
    pub fn respond_to_search(&self, query: &str, result: Result<Vec<Book>, RemoteError>) {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.to_string(), result);
    }

    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(query.to_string(), delay);
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn respond_to_description(&self, result: Result<Option<String>, DataError>) {
        *self.description.lock().unwrap() = result;
    }

    pub fn delay_description(&self, delay: Duration) {
        *self.description_delay.lock().unwrap() = delay;
    }

    /// Pushes a favorites snapshot as the store would after a write.
    pub fn emit_favorites(&self, books: Vec<Book>) {
        self.favorites.send_replace(books);
    }

    pub fn favorites(&self) -> Vec<Book> {
        self.favorites.borrow().clone()
    }

    /// Live favorites subscribers (controller mirrors).
    pub fn favorite_receivers(&self) -> usize {
        self.favorites.receiver_count()
    }

    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn fail_writes(&self, failure: Option<LocalError>) {
        *self.write_failure.lock().unwrap() = failure;
    }

    async fn before_write(&self) -> EmptyResult<LocalError> {
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match *self.write_failure.lock().unwrap() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookRepository for FakeBookRepository {
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RemoteError> {
        self.search_calls.lock().unwrap().push(query.to_string());
        let delay = self.search_delays.lock().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.search_results.lock().unwrap().get(query).cloned();
        result.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_book_description(&self, _book_id: &str) -> Result<Option<String>, DataError> {
        self.description_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.description_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.description.lock().unwrap().clone()
    }

    fn get_favorite_books(&self) -> BookStream {
        self.favorite_subscriptions.fetch_add(1, Ordering::SeqCst);
        WatchStream::new(self.favorites.subscribe()).boxed()
    }

    fn is_book_favorite(&self, id: &str) -> BoxStream<'static, bool> {
        let id = id.to_string();
        WatchStream::new(self.favorites.subscribe())
            .map(move |books| books.iter().any(|book| book.id == id))
            .boxed()
    }

    async fn mark_as_favorite(&self, book: &Book) -> EmptyResult<LocalError> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        self.before_write().await?;
        let book = book.clone();
        self.favorites.send_modify(|books| {
            books.retain(|existing| existing.id != book.id);
            books.push(book);
        });
        Ok(())
    }

    async fn delete_from_favorites(&self, id: &str) -> EmptyResult<LocalError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.before_write().await?;
        if self.favorites.borrow().iter().any(|book| book.id == id) {
            self.favorites
                .send_modify(|books| books.retain(|book| book.id != id));
        }
        Ok(())
    }
}
