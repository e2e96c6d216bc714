//! Mercado Editorial source adapter.
//!
//! Queries the Brazilian Mercado Editorial metadata API by ISBN. The API is
//! the canonical source for pt-BR editions; contribution records carry typed
//! roles ("Autor", "Tradutor", ...) that map onto [`ContributorRole`].

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::MercadoEditorialConfig;
use crate::error::{Error, Result};
use crate::sources::adapter::{
    dedup_by_provider_id, normalize_isbn, Contributor, ContributorRole, ExternalBookResult,
    SourceAdapter, SourceDescriptor, USER_AGENT,
};

const MERCADO_EDITORIAL_BASE_URL: &str = "https://api.mercadoeditorial.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Mercado Editorial API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BookResponse {
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Deserialize, Default)]
struct Book {
    isbn: Option<String>,
    titulo: Option<String>,
    subtitulo: Option<String>,
    sinopse: Option<String>,
    paginas: Option<PageCount>,
    editora: Option<Publisher>,
    #[serde(default)]
    contribuicao: Vec<Contribution>,
    imagens: Option<Images>,
}

/// The API reports page counts sometimes as a number, sometimes as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageCount {
    Number(u32),
    Text(String),
}

impl PageCount {
    fn value(&self) -> u32 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Publisher {
    nome_fantasia: Option<String>,
    razao_social: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contribution {
    nome: Option<String>,
    sobrenome: Option<String>,
    tipo_de_contribuicao: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Images {
    imagem_primeira_capa: Option<CoverImage>,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    grande: Option<String>,
    pequena: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter implementation
// ---------------------------------------------------------------------------

/// Mercado Editorial source adapter.
pub struct MercadoEditorialAdapter {
    client: reqwest::Client,
    config: MercadoEditorialConfig,
    descriptor: SourceDescriptor,
    base_url: String,
}

impl MercadoEditorialAdapter {
    /// Create a new Mercado Editorial adapter.
    pub fn new(config: MercadoEditorialConfig) -> Self {
        Self::with_base_url(config, MERCADO_EDITORIAL_BASE_URL)
    }

    /// Create an adapter talking to a non-default endpoint. Used by tests to
    /// point the adapter at a local mock server.
    pub fn with_base_url(config: MercadoEditorialConfig, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build reqwest client");

        let mut description = HashMap::new();
        description.insert(
            "en".to_string(),
            "Brazilian publishing market metadata".to_string(),
        );
        description.insert(
            "pt-BR".to_string(),
            "Metadados do mercado editorial brasileiro".to_string(),
        );

        Self {
            client,
            config,
            descriptor: SourceDescriptor {
                key: "mercado_editorial".to_string(),
                name: "Mercado Editorial".to_string(),
                home_url: "https://www.mercadoeditorial.org".to_string(),
                search_url: format!("{base_url}/api/v1.2/book"),
                locale: "pt-BR".to_string(),
                description,
            },
            base_url: base_url.to_string(),
        }
    }

    fn map_book(&self, book: Book) -> ExternalBookResult {
        let isbn = book.isbn.as_deref().and_then(normalize_isbn);
        // The ISBN is the provider-native id for this API.
        let provider_id = isbn
            .clone()
            .or(book.isbn)
            .unwrap_or_default();

        let title = match (book.titulo, book.subtitulo) {
            (Some(title), Some(sub)) if !sub.is_empty() => format!("{title}: {sub}"),
            (Some(title), _) => title,
            (None, _) => String::new(),
        };

        let contributors = book
            .contribuicao
            .iter()
            .filter_map(map_contribution)
            .collect();

        let publisher = book
            .editora
            .and_then(|p| p.nome_fantasia.or(p.razao_social));

        let cover_url = book
            .imagens
            .and_then(|i| i.imagem_primeira_capa)
            .and_then(|c| c.grande.or(c.pequena));

        ExternalBookResult {
            page_url: format!(
                "{}/busca?isbn={provider_id}",
                self.descriptor.home_url
            ),
            provider_id,
            isbn,
            title,
            contributors,
            publisher,
            synopsis: book.sinopse.filter(|s| !s.is_empty()),
            page_count: book.paginas.map(|p| p.value()).unwrap_or(0),
            cover_url,
            source_key: self.descriptor.key.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for MercadoEditorialAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn search_by_identifier(&self, identifier: &str) -> Result<Vec<ExternalBookResult>> {
        let url = format!("{}/api/v1.2/book?isbn={identifier}", self.base_url);
        debug!(url = %url, "Mercado Editorial book lookup");

        let key = &self.descriptor.key;
        let body: BookResponse = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Mercado Editorial request failed: {url}"))
            .map_err(|e| Error::source_unavailable(key, e))?
            .error_for_status()
            .context("Mercado Editorial request returned error status")
            .map_err(|e| Error::source_unavailable(key, e))?
            .json()
            .await
            .context("failed to parse Mercado Editorial response")
            .map_err(|e| Error::source_unavailable(key, e))?;

        let results = body.books.into_iter().map(|b| self.map_book(b)).collect();

        Ok(dedup_by_provider_id(results))
    }
}

/// Build a contributor from a contribution record: `nome` + `sobrenome`
/// concatenated, role mapped from the pt-BR contribution type.
fn map_contribution(raw: &Contribution) -> Option<Contributor> {
    let name = [raw.nome.as_deref(), raw.sobrenome.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        return None;
    }

    let role = match raw.tipo_de_contribuicao.as_deref() {
        Some("Autor") | Some("Autora") => ContributorRole::Author,
        Some("Tradutor") | Some("Tradutora") => ContributorRole::Translator,
        Some("Ilustrador") | Some("Ilustradora") => ContributorRole::Illustrator,
        Some("Editor") | Some("Organizador") => ContributorRole::Editor,
        _ => ContributorRole::Other,
    };

    Some(Contributor { name, role })
}
