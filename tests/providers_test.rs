//! Adapter integration tests against mocked provider HTTP endpoints.

use assert_matches::assert_matches;
use bookbinder::config::{GoogleBooksConfig, MercadoEditorialConfig, OpenLibraryConfig};
use bookbinder::sources::providers::{
    GoogleBooksAdapter, MercadoEditorialAdapter, OpenLibraryAdapter,
};
use bookbinder::sources::{ContributorRole, SourceAdapter};
use bookbinder::Error;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISBN: &str = "9788545702870";

#[tokio::test]
async fn google_books_maps_volumes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", format!("isbn:{ISBN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalItems": 1,
            "items": [{
                "id": "vol-1",
                "volumeInfo": {
                    "title": "O Hobbit",
                    "authors": ["J. R. R. Tolkien"],
                    "publisher": "HarperCollins Brasil",
                    "description": "Bilbo deixa o Condado.",
                    "pageCount": 328,
                    "industryIdentifiers": [
                        {"type": "ISBN_13", "identifier": ISBN}
                    ],
                    "imageLinks": {
                        "thumbnail": "https://books.google.com/c?id=vol-1&edge=curl&zoom=1"
                    },
                    "canonicalVolumeLink": "https://books.google.com/books?id=vol-1"
                }
            }]
        })))
        .mount(&server)
        .await;

    let adapter = GoogleBooksAdapter::with_base_url(GoogleBooksConfig::default(), "pt-BR", &server.uri());
    let results = adapter.search_by_identifier(ISBN).await.unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.provider_id, "vol-1");
    assert_eq!(result.isbn.as_deref(), Some(ISBN));
    assert_eq!(result.title, "O Hobbit");
    assert_eq!(result.contributors[0].name, "J. R. R. Tolkien");
    assert_eq!(result.page_count, 328);
    assert_eq!(
        result.cover_url.as_deref(),
        Some("https://books.google.com/c?id=vol-1&zoom=1")
    );
    assert_eq!(result.source_key, "google_books");
}

#[tokio::test]
async fn google_books_dedups_repeated_volume_ids() {
    let server = MockServer::start().await;
    let volume = json!({
        "id": "vol-dup",
        "volumeInfo": {"title": "Same Volume"}
    });
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalItems": 2,
            "items": [volume.clone(), volume]
        })))
        .mount(&server)
        .await;

    let adapter = GoogleBooksAdapter::with_base_url(GoogleBooksConfig::default(), "en", &server.uri());
    let results = adapter.search_by_identifier(ISBN).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider_id, "vol-dup");
}

#[tokio::test]
async fn google_books_server_error_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = GoogleBooksAdapter::with_base_url(GoogleBooksConfig::default(), "en", &server.uri());
    let err = adapter.search_by_identifier(ISBN).await.unwrap_err();

    assert_matches!(err, Error::SourceUnavailable { ref key, .. } if key == "google_books");
}

#[tokio::test]
async fn google_books_malformed_body_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let adapter = GoogleBooksAdapter::with_base_url(GoogleBooksConfig::default(), "en", &server.uri());
    let err = adapter.search_by_identifier(ISBN).await.unwrap_err();

    assert_matches!(err, Error::SourceUnavailable { .. });
}

#[tokio::test]
async fn open_library_maps_bib_keyed_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(query_param("bibkeys", format!("ISBN:{ISBN}")))
        .and(query_param("format", "json"))
        .and(query_param("jscmd", "data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            (format!("ISBN:{ISBN}")): {
                "key": "/books/OL12345M",
                "url": "https://openlibrary.org/books/OL12345M/O_Hobbit",
                "title": "O Hobbit",
                "authors": [{"name": "J. R. R. Tolkien"}],
                "publishers": [{"name": "HarperCollins Brasil"}],
                "number_of_pages": 328,
                "identifiers": {"isbn_13": [ISBN]},
                "cover": {
                    "large": "https://covers.openlibrary.org/b/id/1-L.jpg",
                    "small": "https://covers.openlibrary.org/b/id/1-S.jpg"
                },
                "excerpts": [{"text": "In a hole in the ground there lived a hobbit."}]
            }
        })))
        .mount(&server)
        .await;

    let adapter = OpenLibraryAdapter::with_base_url(OpenLibraryConfig::default(), &server.uri());
    let results = adapter.search_by_identifier(ISBN).await.unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.provider_id, "/books/OL12345M");
    assert_eq!(result.isbn.as_deref(), Some(ISBN));
    assert_eq!(result.publisher.as_deref(), Some("HarperCollins Brasil"));
    assert_eq!(
        result.cover_url.as_deref(),
        Some("https://covers.openlibrary.org/b/id/1-L.jpg")
    );
    assert_eq!(
        result.page_url,
        "https://openlibrary.org/books/OL12345M/O_Hobbit"
    );
    assert_eq!(result.source_key, "open_library");
}

#[tokio::test]
async fn open_library_unknown_isbn_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let adapter = OpenLibraryAdapter::with_base_url(OpenLibraryConfig::default(), &server.uri());
    let results = adapter.search_by_identifier("0000000000").await.unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn mercado_editorial_maps_contribution_roles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1.2/book"))
        .and(query_param("isbn", ISBN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "books": [{
                "isbn": ISBN,
                "titulo": "O Hobbit",
                "subtitulo": "ou lá e de volta outra vez",
                "sinopse": "Bilbo deixa o Condado.",
                "paginas": "328",
                "editora": {"nome_fantasia": "HarperCollins Brasil"},
                "contribuicao": [
                    {"nome": "J. R. R.", "sobrenome": "Tolkien", "tipo_de_contribuicao": "Autor"},
                    {"nome": "Reinaldo", "sobrenome": "Imbrozio", "tipo_de_contribuicao": "Tradutor"}
                ],
                "imagens": {
                    "imagem_primeira_capa": {
                        "grande": "https://img.mercadoeditorial.org/g.jpg",
                        "pequena": "https://img.mercadoeditorial.org/p.jpg"
                    }
                }
            }]
        })))
        .mount(&server)
        .await;

    let config = MercadoEditorialConfig { enabled: true };
    let adapter = MercadoEditorialAdapter::with_base_url(config, &server.uri());
    let results = adapter.search_by_identifier(ISBN).await.unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.provider_id, ISBN);
    assert_eq!(result.title, "O Hobbit: ou l\u{e1} e de volta outra vez");
    assert_eq!(result.page_count, 328);
    assert_eq!(result.contributors.len(), 2);
    assert_eq!(result.contributors[0].role, ContributorRole::Author);
    assert_eq!(result.contributors[1].role, ContributorRole::Translator);
    assert_eq!(result.contributors[1].name, "Reinaldo Imbrozio");
    assert_eq!(
        result.cover_url.as_deref(),
        Some("https://img.mercadoeditorial.org/g.jpg")
    );
    assert_eq!(result.source_key, "mercado_editorial");
}

#[tokio::test]
async fn mercado_editorial_empty_books_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1.2/book"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"books": []})))
        .mount(&server)
        .await;

    let config = MercadoEditorialConfig { enabled: true };
    let adapter = MercadoEditorialAdapter::with_base_url(config, &server.uri());
    let results = adapter.search_by_identifier(ISBN).await.unwrap();

    assert!(results.is_empty());
}
