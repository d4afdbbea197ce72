mod common;

use std::sync::Arc;

use sealnote_core::crypto::PassphraseKdf;
use sealnote_core::storage::{LocalFileBackend, ReadOutcome, StorageFormat, StoredBlob};
use sealnote_core::{DecryptedMessage, Storage, StorageError};
use tempfile::tempdir;

use common::{at, MemoryBackend};

fn storage(backends: &[Arc<MemoryBackend>]) -> Storage {
    Storage::new(
        backends
            .iter()
            .map(|backend| Arc::clone(backend) as Arc<dyn StorageFormat>)
            .collect(),
    )
}

fn encoded(content: &str) -> Vec<u8> {
    DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .update_content(content)
        .unwrap()
        .into_message()
        .encode()
        .unwrap()
}

#[tokio::test]
async fn test_newest_wins_and_stale_backend_is_repaired() {
    let old = StoredBlob::new(encoded("old"), at(0));
    let new = StoredBlob::new(encoded("new"), at(10));
    let local = MemoryBackend::with_blob("local", old);
    let drive = MemoryBackend::with_blob("drive", new.clone());

    let report = storage(&[local.clone(), drive.clone()]).read().await.unwrap();

    let message = report.message().unwrap();
    let decrypted = message.decrypt_with_passphrase("correct").unwrap();
    assert_eq!(decrypted.content(), "new");
    assert_eq!(report.repaired, vec!["local".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(local.get(), Some(new));
    assert_eq!(drive.write_count(), 0);
}

#[tokio::test]
async fn test_second_read_repairs_nothing() {
    let local = MemoryBackend::with_blob("local", StoredBlob::new(encoded("a"), at(0)));
    let drive = MemoryBackend::new("drive");
    let storage = storage(&[local.clone(), drive.clone()]);

    let first = storage.read().await.unwrap();
    assert_eq!(first.repaired, vec!["drive".to_string()]);

    let second = storage.read().await.unwrap();
    assert!(second.repaired.is_empty());
    assert_eq!(local.write_count(), 0);
    assert_eq!(drive.write_count(), 1);
}

#[tokio::test]
async fn test_all_absent_is_empty() {
    let local = MemoryBackend::new("local");
    let drive = MemoryBackend::new("drive");

    let report = storage(&[local.clone(), drive.clone()]).read().await.unwrap();

    assert_eq!(report.outcome, ReadOutcome::Empty);
    assert_eq!(local.write_count() + drive.write_count(), 0);
}

#[tokio::test]
async fn test_undecodable_bytes_are_not_empty() {
    let local = MemoryBackend::with_blob("local", StoredBlob::new(b"garbage".to_vec(), at(0)));

    let result = storage(&[local]).read().await;

    assert!(matches!(result, Err(StorageError::Decode(_))));
}

#[tokio::test]
async fn test_edit_lands_on_lagging_backend() {
    let local = MemoryBackend::new("local");
    let drive = MemoryBackend::new("drive");
    let storage = storage(&[local.clone(), drive.clone()]);

    let created = DecryptedMessage::create("correct", PassphraseKdf::Sha512).unwrap();
    assert_eq!(created.content(), "");
    storage.write(created.message()).await.unwrap();
    let before_update = drive.get().unwrap();

    let updated = created.update_content("secret").unwrap();
    storage.write(updated.message()).await.unwrap();

    // The remote copy missed the update.
    drive.set(Some(before_update));

    let report = storage.read().await.unwrap();
    let decrypted = report
        .message()
        .unwrap()
        .decrypt_with_passphrase("correct")
        .unwrap();
    assert_eq!(decrypted.content(), "secret");
    assert_eq!(report.repaired, vec!["drive".to_string()]);
    assert_eq!(drive.get(), local.get());
}

#[tokio::test]
async fn test_tie_goes_to_higher_priority() {
    let local = MemoryBackend::with_blob("local", StoredBlob::new(encoded("first"), at(5)));
    let drive = MemoryBackend::with_blob("drive", StoredBlob::new(encoded("second"), at(5)));

    let report = storage(&[local.clone(), drive.clone()]).read().await.unwrap();

    let decrypted = report
        .message()
        .unwrap()
        .decrypt_with_passphrase("correct")
        .unwrap();
    assert_eq!(decrypted.content(), "first");
    assert_eq!(report.repaired, vec!["drive".to_string()]);
}

#[tokio::test]
async fn test_failed_backend_is_reported_not_repaired() {
    let local = MemoryBackend::with_blob("local", StoredBlob::new(encoded("a"), at(0)));
    let drive = MemoryBackend::new("drive");
    drive.fail_reads(true);

    let report = storage(&[local.clone(), drive.clone()]).read().await.unwrap();

    assert!(report.message().is_some());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].backend, "drive");
    assert!(report.repaired.is_empty());
    assert_eq!(drive.write_count(), 0);
}

#[tokio::test]
async fn test_failed_repair_is_reported() {
    let local = MemoryBackend::with_blob("local", StoredBlob::new(encoded("a"), at(0)));
    let drive = MemoryBackend::new("drive");
    drive.fail_writes(true);

    let report = storage(&[local, drive]).read().await.unwrap();

    assert!(report.message().is_some());
    assert!(report.repaired.is_empty());
    assert_eq!(report.failures[0].backend, "drive");
}

#[tokio::test]
async fn test_failure_plus_absent_is_inconclusive() {
    let local = MemoryBackend::new("local");
    let drive = MemoryBackend::new("drive");
    drive.fail_reads(true);

    let result = storage(&[local, drive]).read().await;

    assert!(matches!(result, Err(StorageError::Inconclusive(failures)) if failures.len() == 1));
}

#[tokio::test]
async fn test_all_backends_failing() {
    let local = MemoryBackend::new("local");
    let drive = MemoryBackend::new("drive");
    local.fail_reads(true);
    drive.fail_reads(true);

    let result = storage(&[local.clone(), drive.clone()]).read().await;
    assert!(matches!(result, Err(StorageError::AllBackendsFailed(failures)) if failures.len() == 2));

    local.fail_writes(true);
    drive.fail_writes(true);
    let message = DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .into_message();
    let result = storage(&[local, drive]).write(&message).await;
    assert!(matches!(result, Err(StorageError::AllBackendsFailed(_))));
}

#[tokio::test]
async fn test_write_reaches_every_backend_with_same_blob() {
    let local = MemoryBackend::new("local");
    let drive = MemoryBackend::new("drive");
    drive.fail_writes(true);
    let message = DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .into_message();

    let report = storage(&[local.clone(), drive.clone()])
        .write(&message)
        .await
        .unwrap();

    assert_eq!(report.written, vec!["local".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(local.get().unwrap().bytes, message.encode().unwrap());
}

#[tokio::test]
async fn test_local_file_backends_converge() {
    let dir = tempdir().unwrap();
    let primary = Arc::new(LocalFileBackend::named("primary", dir.path().join("a.json")));
    let mirror = Arc::new(LocalFileBackend::named("mirror", dir.path().join("b").join("a.json")));
    mirror
        .write(&StoredBlob::new(encoded("from mirror"), at(100)))
        .await
        .unwrap();
    let storage = Storage::new(vec![
        primary.clone() as Arc<dyn StorageFormat>,
        mirror.clone() as Arc<dyn StorageFormat>,
    ]);

    let report = storage.read().await.unwrap();

    assert_eq!(report.repaired, vec!["primary".to_string()]);
    let primary_blob = primary.read().await.unwrap().unwrap();
    let mirror_blob = mirror.read().await.unwrap().unwrap();
    assert_eq!(primary_blob, mirror_blob);
    assert_eq!(primary_blob.modified_time, at(100));

    let again = storage.read().await.unwrap();
    assert!(again.repaired.is_empty());
}
