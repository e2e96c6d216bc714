//! Integration tests for the cover artifact lifecycle, including the
//! event-driven cleanup path.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bookbinder::covers::{BookLookup, CoverLifecycleManager, CoverStorage, ThumbnailSize};
use bookbinder::events::{DomainEvent, EntityKind, EventBus, EventSelector, InProcessBus};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct AnyBook;

#[async_trait]
impl BookLookup for AnyBook {
    async fn exists(&self, _book_id: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}

fn manager(dir: &tempfile::TempDir) -> Arc<CoverLifecycleManager> {
    Arc::new(CoverLifecycleManager::new(
        CoverStorage::new(dir.path().to_path_buf()),
        Arc::new(AnyBook),
    ))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Upload round trip: the primary and every thumbnail decode as JPEG at the
/// configured target dimensions.
#[tokio::test]
async fn upload_round_trip_yields_decodable_variants() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);

    let stored = manager
        .create_or_replace("book-1", &png_bytes(900, 600))
        .await
        .unwrap();

    let primary = std::fs::read(&stored.primary_path).unwrap();
    assert_eq!(
        image::guess_format(&primary).unwrap(),
        image::ImageFormat::Jpeg
    );
    let primary = image::load_from_memory(&primary).unwrap();
    assert_eq!((primary.width(), primary.height()), (900, 600));

    for (path, size) in stored.thumbnail_paths.iter().zip(ThumbnailSize::all()) {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), size.target_width());
    }
}

/// Publishing a book deletion removes the artifact set; a duplicate delivery
/// of the same event is harmless.
#[tokio::test]
async fn deletion_event_cleans_up_idempotently() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);
    let bus = InProcessBus::new();
    bus.subscribe(
        EventSelector::deletions_of(EntityKind::Book),
        manager.cleanup_handler(),
    );

    manager
        .create_or_replace("book-1", &png_bytes(100, 100))
        .await
        .unwrap();
    assert!(manager.primary_path("book-1").is_some());

    let event = DomainEvent::deleted(EntityKind::Book, "book-1");
    bus.publish(event.clone()).await.unwrap();
    wait_until(|| manager.primary_path("book-1").is_none()).await;
    assert!(!dir.path().join("book-1").exists());

    // Redelivery after the artifacts are gone: nothing fails, nothing comes
    // back.
    bus.publish(event).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!dir.path().join("book-1").exists());
}

/// Deletions for one book leave another book's artifacts alone.
#[tokio::test]
async fn cleanup_scoped_to_deleted_book() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);
    let bus = InProcessBus::new();
    bus.subscribe(
        EventSelector::deletions_of(EntityKind::Book),
        manager.cleanup_handler(),
    );

    manager
        .create_or_replace("keep", &png_bytes(40, 40))
        .await
        .unwrap();
    manager
        .create_or_replace("drop", &png_bytes(40, 40))
        .await
        .unwrap();

    bus.publish(DomainEvent::deleted(EntityKind::Book, "drop"))
        .await
        .unwrap();
    wait_until(|| manager.primary_path("drop").is_none()).await;

    assert!(manager.primary_path("keep").is_some());
}

/// Full replacement on re-upload: the set is regenerated from the new bytes.
#[tokio::test]
async fn reupload_regenerates_full_set() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);

    manager
        .create_or_replace("book-1", &png_bytes(500, 500))
        .await
        .unwrap();
    let stored = manager
        .create_or_replace("book-1", &png_bytes(80, 120))
        .await
        .unwrap();

    let primary = image::open(&stored.primary_path).unwrap();
    assert_eq!((primary.width(), primary.height()), (80, 120));
    // The 80px-wide source is narrower than both targets; thumbnails keep
    // the source dimensions rather than upscaling.
    for path in &stored.thumbnail_paths {
        let img = image::open(path).unwrap();
        assert_eq!(img.width(), 80);
    }
}

/// Concurrent create and delete for the same id serialize through the
/// per-id lock and settle into one of the two consistent end states.
#[tokio::test]
async fn concurrent_create_and_delete_stay_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);
    let bytes = png_bytes(64, 64);

    for _ in 0..10 {
        let create = {
            let manager = Arc::clone(&manager);
            let bytes = bytes.clone();
            tokio::spawn(async move { manager.create_or_replace("book-1", &bytes).await })
        };
        let delete = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.delete("book-1").await })
        };
        create.await.unwrap().unwrap();
        delete.await.unwrap();

        // Either the full set exists or nothing does; never a partial set.
        let storage = CoverStorage::new(dir.path().to_path_buf());
        assert_eq!(storage.has_any("book-1"), storage.is_complete("book-1"));
    }
}
