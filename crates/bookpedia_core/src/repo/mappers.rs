//! Conversions between wire DTOs, persisted favorites and the `Book` model.

use super::favorite_repo::FavoriteBookRecord;
use crate::model::book::Book;
use crate::remote::SearchedBookDto;

/// Maps one search entry to a domain book.
///
/// `covers_base_url` is the cover service root without trailing slash.
pub fn searched_book_to_book(dto: SearchedBookDto, covers_base_url: &str) -> Book {
    let id = dto
        .id
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let image_url = match dto.cover_key.as_deref().filter(|key| !key.is_empty()) {
        Some(edition_key) => format!("{covers_base_url}/b/olid/{edition_key}-L.jpg"),
        None => format!(
            "{covers_base_url}/b/id/{}-L.jpg",
            dto.cover_alternative_key.unwrap_or_default()
        ),
    };

    Book {
        id,
        title: dto.title,
        image_url,
        authors: dto.author_names,
        description: None,
        languages: dto.languages,
        first_publish_year: dto.first_publish_year.map(|year| year.to_string()),
        average_rating: dto.ratings_average,
        rating_count: dto.ratings_count,
        num_pages: dto.num_pages_median,
        num_editions: dto.num_editions,
    }
}

pub fn book_to_record(book: &Book) -> FavoriteBookRecord {
    FavoriteBookRecord {
        id: book.id.clone(),
        title: book.title.clone(),
        description: book.description.clone(),
        image_url: book.image_url.clone(),
        languages: book.languages.clone(),
        authors: book.authors.clone(),
        first_publish_year: book.first_publish_year.clone(),
        ratings_average: book.average_rating,
        ratings_count: book.rating_count,
        num_pages_median: book.num_pages,
        num_editions: book.num_editions,
    }
}

pub fn record_to_book(record: FavoriteBookRecord) -> Book {
    Book {
        id: record.id,
        title: record.title,
        image_url: record.image_url,
        authors: record.authors,
        description: record.description,
        languages: record.languages,
        first_publish_year: record.first_publish_year,
        average_rating: record.ratings_average,
        rating_count: record.ratings_count,
        num_pages: record.num_pages_median,
        num_editions: record.num_editions,
    }
}
