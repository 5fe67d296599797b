//! Tantivy-based search index module.
//!
//! Provides full-text search over listings with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, INDEXED, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Listing;

/// Field boosts, title weighs most.
const BOOST_TITLE: f32 = 10.0;
const BOOST_BRAND: f32 = 8.0;
const BOOST_MODEL: f32 = 7.0;
const BOOST_DESCRIPTION: f32 = 4.0;
const BOOST_LOCATION: f32 = 3.0;
const BOOST_SPECS: f32 = 2.0;

/// Upper bound on a page of search hits.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// A matching listing id and its relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub listing_id: i64,
    pub score: f32,
}

/// One page of hits plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

struct SearchFields {
    listing_id: Field,
    title: Field,
    brand: Field,
    model: Field,
    description: Field,
    location: Field,
    specs: Field,
}

impl SearchFields {
    fn boosted(&self) -> [(Field, f32); 6] {
        [
            (self.title, BOOST_TITLE),
            (self.brand, BOOST_BRAND),
            (self.model, BOOST_MODEL),
            (self.description, BOOST_DESCRIPTION),
            (self.location, BOOST_LOCATION),
            (self.specs, BOOST_SPECS),
        ]
    }
}

/// Tantivy search index for listings.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let listing_id = schema_builder.add_i64_field("listing_id", INDEXED | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let brand = schema_builder.add_text_field("brand", TEXT);
        let model = schema_builder.add_text_field("model", TEXT);
        let description = schema_builder.add_text_field("description", TEXT);
        let location = schema_builder.add_text_field("location", TEXT);
        let specs = schema_builder.add_text_field("specs", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            listing_id,
            title,
            brand,
            model,
            description,
            location,
            specs,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with the given listings.
    pub async fn rebuild(&self, listings: &[Listing]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for listing in listings {
            writer.add_document(self.create_document(listing))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} listings", listings.len());
        Ok(())
    }

    /// Index a single listing, replacing any previous document for it.
    pub async fn index_listing(&self, listing: &Listing) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_i64(self.fields.listing_id, listing.id));
        writer.add_document(self.create_document(listing))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    pub async fn remove_listing(&self, listing_id: i64) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_i64(self.fields.listing_id, listing_id));
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search listings. A blank query matches nothing; `limit` is capped.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage, AppError> {
        if query_str.trim().is_empty() {
            return Ok(SearchPage::default());
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);

        let searcher = self.reader.searcher();

        // Free text from the search box: tolerate stray operators.
        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        for (field, boost) in self.fields.boosted() {
            let (field_query, _) =
                QueryParser::for_index(&self.index, vec![field]).parse_query_lenient(query_str);
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let combined_query = BooleanQuery::new(subqueries);

        // TopDocs allocates its whole window up front, so never ask for more
        // slots than the index holds.
        let num_docs = searcher.num_docs() as usize;
        if offset >= num_docs {
            let total = searcher
                .search(&combined_query, &Count)
                .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;
            return Ok(SearchPage {
                hits: Vec::new(),
                total,
            });
        }
        let window = offset.saturating_add(limit).min(num_docs);

        let (top_docs, total) = searcher
            .search(&combined_query, &(TopDocs::with_limit(window), Count))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let listing_id = doc.get_first(self.fields.listing_id)?.as_i64()?;
                Some(SearchHit { listing_id, score })
            })
            .collect();

        Ok(SearchPage { hits, total })
    }

    fn create_document(&self, listing: &Listing) -> TantivyDocument {
        doc!(
            self.fields.listing_id => listing.id,
            self.fields.title => listing.title.clone(),
            self.fields.brand => listing.brand.clone(),
            self.fields.model => listing.model.clone(),
            self.fields.description => listing.description.clone(),
            self.fields.location => listing.location.clone(),
            self.fields.specs => listing.specifications.search_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::listing;
    use tempfile::TempDir;

    fn sample() -> Vec<Listing> {
        let mut diesel = listing(2, "Tracteur robuste", "Kubota", 6500.0, 2018);
        diesel.description = "Moteur diesel, tondeuse ventrale".to_string();
        diesel.location = "Rennes".to_string();
        vec![
            listing(1, "Autoportée Husqvarna TC 138", "Husqvarna", 1800.0, 2020),
            diesel,
            listing(3, "Tondeuse John Deere X350", "John Deere", 3200.0, 2021),
        ]
    }

    #[tokio::test]
    async fn test_search_by_title_and_brand() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&sample()).await.unwrap();

        let page = index.search("husqvarna", 10, 0).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].listing_id, 1);

        let page = index.search("rennes", 10, 0).unwrap();
        assert_eq!(page.hits[0].listing_id, 2);
    }

    #[tokio::test]
    async fn test_title_outranks_description() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&sample()).await.unwrap();

        // "tondeuse" is in listing 3's title and listing 2's description.
        let page = index.search("tondeuse", 10, 0).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.hits[0].listing_id, 3);
    }

    #[tokio::test]
    async fn test_reindex_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&sample()).await.unwrap();

        let mut renamed = sample().remove(0);
        renamed.title = "Micro-tracteur Stiga".to_string();
        index.index_listing(&renamed).await.unwrap();
        assert_eq!(index.search("stiga", 10, 0).unwrap().hits[0].listing_id, 1);
        assert_eq!(index.search("autoportée", 10, 0).unwrap().total, 0);

        index.remove_listing(1).await.unwrap();
        assert_eq!(index.search("stiga", 10, 0).unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_pagination() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&sample()).await.unwrap();

        let page = index.search("tondeuse", 1, 1).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].listing_id, 2);
    }

    #[tokio::test]
    async fn test_offset_past_the_end() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&sample()).await.unwrap();

        for offset in [3, 1 << 40, usize::MAX] {
            let page = index.search("tondeuse", 20, offset).unwrap();
            assert!(page.hits.is_empty());
            assert_eq!(page.total, 2);
        }

        let page = index.search("tondeuse", usize::MAX, 0).unwrap();
        assert_eq!(page.hits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let page = index.search("   ", 10, 0).unwrap();
        assert!(page.hits.is_empty());
        assert_eq!(page.total, 0);
    }
}
