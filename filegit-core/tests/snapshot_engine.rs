use filegit_core::detector::current_digest;
use filegit_core::diff::{DiffLineType, EntryDiff};
use filegit_core::{CommitKind, Config, Digest, Error, Repository, SnapshotOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    repo: Repository,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(Config::from_root(dir.path().join(".filegit"))).unwrap();
        Self { dir, repo }
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn snapshot(&self, path: &Path) -> filegit_core::Commit {
        // Keep timestamps strictly ordered even on coarse clocks.
        sleep(Duration::from_millis(2));
        match self.repo.maybe_snapshot(path, CommitKind::Auto).unwrap() {
            SnapshotOutcome::Created(commit) => commit,
            other => panic!("expected a new commit, got {:?}", other),
        }
    }
}

#[test]
fn notes_scenario() {
    let fx = Fixture::new();
    let notes = fx.file("notes.txt", "a");

    let c1 = fx.snapshot(&notes);
    let d1 = Digest::of(b"a");
    assert_eq!(c1.digest, d1);
    assert_eq!(c1.kind, CommitKind::Auto);
    assert_eq!(fx.repo.history(&notes).unwrap().len(), 1);

    fs::write(&notes, "ab").unwrap();
    let c2 = fx.snapshot(&notes);
    let d2 = Digest::of(b"ab");
    assert_ne!(d1, d2);

    let timeline = fx.repo.timeline(&notes).unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].commit().unwrap().id, c2.id);
    assert_eq!(timeline[0].predecessor, Some(d1.clone()));
    assert_eq!(timeline[1].commit().unwrap().id, c1.id);
    assert_eq!(timeline[1].predecessor, None);

    fx.repo.promote(c2.id, "checkpoint").unwrap();
    let history = fx.repo.history(&notes).unwrap();
    assert!(history[0].is_manual());
    assert_eq!(history[0].message(), Some("checkpoint"));

    fx.repo.restore(&notes, &d1).unwrap();
    assert_eq!(fs::read_to_string(&notes).unwrap(), "a");
    assert_eq!(current_digest(&notes).unwrap(), Some(d1.clone()));

    let timeline = fx.repo.timeline(&notes).unwrap();
    assert_eq!(timeline.len(), 3);
    assert!(timeline[0].is_uncommitted());
    assert_eq!(timeline[0].digest, d1);
    assert_eq!(timeline[0].predecessor, Some(d2));
}

#[test]
fn identical_content_shares_one_blob() {
    let fx = Fixture::new();
    let first = fx.file("one.txt", "shared\n");
    let second = fx.file("two.txt", "shared\n");

    let c1 = fx.snapshot(&first);
    let c2 = fx.snapshot(&second);

    assert_eq!(c1.digest, c2.digest);
    assert_eq!(fx.repo.store().digests().unwrap(), vec![c1.digest]);
}

#[test]
fn reverting_content_reuses_blob_but_adds_commit() {
    let fx = Fixture::new();
    let path = fx.file("flip.txt", "x");

    fx.snapshot(&path);
    fs::write(&path, "y").unwrap();
    fx.snapshot(&path);
    fs::write(&path, "x").unwrap();
    fx.snapshot(&path);

    assert_eq!(fx.repo.history(&path).unwrap().len(), 3);
    assert_eq!(fx.repo.store().digests().unwrap().len(), 2);
}

#[test]
fn every_commit_references_a_stored_blob() {
    let fx = Fixture::new();
    let a = fx.file("a.txt", "1");
    let b = fx.file("b.txt", "2");

    for round in 0..3 {
        fs::write(&a, format!("a{round}")).unwrap();
        fx.snapshot(&a);
        fs::write(&b, format!("b{round}")).unwrap();
        fx.snapshot(&b);
    }

    let report = fx.repo.verify().unwrap();
    assert!(report.is_healthy());
    assert_eq!(report.commits_checked, 6);
    assert_eq!(report.blobs_checked, 6);
    for (_, digest) in fx.repo.index().referenced_digests().unwrap() {
        assert!(fx.repo.store().exists(&digest));
    }
}

#[test]
fn verify_flags_dangling_rows() {
    let fx = Fixture::new();
    let path = fx.file("d.txt", "content");
    let commit = fx.snapshot(&path);

    fs::remove_file(fx.repo.store().path_for(&commit.digest)).unwrap();

    let report = fx.repo.verify().unwrap();
    assert!(!report.is_healthy());
    assert_eq!(report.dangling, vec![(commit.id, commit.digest)]);
}

#[test]
fn promotion_never_reverts() {
    let fx = Fixture::new();
    let path = fx.file("p.txt", "v1");
    let commit = fx.snapshot(&path);

    fx.repo.promote(commit.id, "first").unwrap();
    let repeat = fx.repo.promote(commit.id, "second");
    assert!(matches!(repeat, Err(Error::InvalidState(_))));

    fs::write(&path, "v2").unwrap();
    fx.snapshot(&path);
    fx.repo.forget(Path::new("/unrelated")).unwrap();

    let promoted = fx.repo.index().get(commit.id).unwrap();
    assert!(promoted.is_manual());
    assert_eq!(promoted.message(), Some("first"));
}

#[test]
fn timeline_with_three_commits() {
    let fx = Fixture::new();
    let path = fx.file("t.txt", "c1");
    let c1 = fx.snapshot(&path);
    fs::write(&path, "c2").unwrap();
    let c2 = fx.snapshot(&path);
    fs::write(&path, "c3").unwrap();
    let c3 = fx.snapshot(&path);

    let ids: Vec<i64> = fx
        .repo
        .timeline(&path)
        .unwrap()
        .iter()
        .map(|e| e.commit().expect("no synthetic entry").id)
        .collect();
    assert_eq!(ids, vec![c3.id, c2.id, c1.id]);

    fs::write(&path, "c4").unwrap();
    let timeline = fx.repo.timeline(&path).unwrap();
    assert_eq!(timeline.len(), 4);
    assert!(timeline[0].is_uncommitted());
    assert_eq!(timeline[0].predecessor, Some(c3.digest));
}

#[test]
fn forget_starts_fresh_history() {
    let fx = Fixture::new();
    let path = fx.file("f.txt", "old");
    let old = fx.snapshot(&path);

    assert_eq!(fx.repo.forget(&path).unwrap(), 1);
    assert!(fx.repo.history(&path).unwrap().is_empty());
    assert_eq!(fx.repo.forget(&path).unwrap(), 0);

    let fresh = fx.snapshot(&path);
    let history = fx.repo.history(&path).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, fresh.id);
    assert!(fresh.id > old.id);
    assert!(fx.repo.store().exists(&old.digest));
}

#[test]
fn diff_of_uncommitted_entry_uses_live_file() {
    let fx = Fixture::new();
    let path = fx.file("live.txt", "one\n");
    fx.snapshot(&path);
    fs::write(&path, "one\ntwo\n").unwrap();

    let timeline = fx.repo.timeline(&path).unwrap();
    let EntryDiff::Text(diff) = fx.repo.diff_entry(&path, &timeline[0]).unwrap() else {
        panic!("expected a text diff");
    };
    assert_eq!(diff.stats(), (1, 0));
    assert!(diff
        .diff_lines
        .iter()
        .any(|l| l.line_type == DiffLineType::Addition && l.content == "two\n"));

    assert!(matches!(
        fx.repo.diff_entry(&path, &timeline[1]).unwrap(),
        EntryDiff::FirstVersion
    ));
}

#[test]
fn uncommitted_entry_of_deleted_file_is_missing() {
    let fx = Fixture::new();
    let path = fx.file("gone.txt", "v1");
    fx.snapshot(&path);
    fs::write(&path, "v2").unwrap();
    let timeline = fx.repo.timeline(&path).unwrap();

    fs::remove_file(&path).unwrap();
    let result = fx.repo.entry_content(&path, &timeline[0]);
    assert!(matches!(result, Err(Error::FileMissing(_))));
    assert_eq!(fx.repo.entry_content(&path, &timeline[1]).unwrap(), b"v1");
}

#[test]
fn second_handle_sees_first_handles_commits() {
    let fx = Fixture::new();
    let other = Repository::open(fx.repo.config().clone()).unwrap();
    let path = fx.file("shared.txt", "from foreground");

    let commit = fx.snapshot(&path);
    let outcome = other.maybe_snapshot(&path, CommitKind::Auto).unwrap();

    assert_eq!(outcome, SnapshotOutcome::NoChange(commit));
}

#[test]
fn offset_less_timestamps_from_older_indexes_keep_ordering() {
    let fx = Fixture::new();
    let path = fx.file("legacy.txt", "old");
    let config = fx.repo.config().clone();

    // Wall-clock local time with no offset, one minute in the past.
    let naive = (chrono::Local::now() - chrono::Duration::seconds(60))
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();
    let conn = rusqlite::Connection::open(&config.index_path).unwrap();
    conn.execute(
        "INSERT INTO commits (file_path, object_hash, message, timestamp, type)
         VALUES (?1, ?2, NULL, ?3, 'auto')",
        rusqlite::params![
            path.to_string_lossy().as_ref(),
            fx.repo.store().put(b"old").unwrap().as_str(),
            naive
        ],
    )
    .unwrap();
    drop(conn);

    let repo = Repository::open(config).unwrap();
    fs::write(&path, "new").unwrap();

    let SnapshotOutcome::Created(fresh) = repo.maybe_snapshot(&path, CommitKind::Auto).unwrap()
    else {
        panic!("expected a new commit");
    };
    assert_eq!(
        repo.maybe_snapshot(&path, CommitKind::Auto).unwrap(),
        SnapshotOutcome::NoChange(fresh.clone())
    );

    let history = repo.history(&path).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, fresh.id);
    assert_eq!(history[1].digest, Digest::of(b"old"));
}

#[test]
fn concurrent_handles_snapshot_without_losing_commits() {
    const THREADS: usize = 4;
    const ROUNDS: usize = 25;

    let fx = Fixture::new();
    let config = fx.repo.config().clone();
    let dir = fx.dir.path().to_path_buf();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let config = config.clone();
            let path = dir.join(format!("worker-{t}.txt"));
            std::thread::spawn(move || {
                let repo = Repository::open(config).unwrap();
                let mut created = 0;
                for round in 0..ROUNDS {
                    fs::write(&path, format!("worker {t} round {round}")).unwrap();
                    match repo.maybe_snapshot(&path, CommitKind::Auto) {
                        Ok(SnapshotOutcome::Created(_)) => created += 1,
                        other => panic!("worker {t} round {round}: {:?}", other),
                    }
                }
                created
            })
        })
        .collect();

    let created: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

    assert_eq!(created, THREADS * ROUNDS);
    assert_eq!(fx.repo.index().referenced_digests().unwrap().len(), created);
    let report = fx.repo.verify().unwrap();
    assert!(report.is_healthy());
    assert_eq!(report.blobs_checked, created);
}
