#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use aead_engine::audit::{compact_entries, format_entry, AsyncLogManager, LogEntry, LogManager};
    use aead_engine::config::EngineConfig;
    use aead_engine::crypto::{AeadEngine, Algorithm, Key, Mode};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aead-engine-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Poll until `check` holds on the file's contents, or give up.
    fn wait_for(path: &Path, check: impl Fn(&str) -> bool) -> String {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            if check(&content) || Instant::now() > deadline {
                return content;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// True while this process still holds a descriptor on `path` (Linux).
    fn is_open_by_us(path: &Path) -> bool {
        let target = std::fs::canonicalize(path).unwrap();
        std::fs::read_dir("/proc/self/fd")
            .map(|fds| {
                fds.filter_map(|e| e.ok())
                    .filter_map(|e| std::fs::read_link(e.path()).ok())
                    .any(|link| link == target)
            })
            .unwrap_or(false)
    }

    #[test]
    fn test_compaction_removes_redundant_markers() {
        let mut entries = vec![
            LogEntry::Marker("rotate".into()),
            LogEntry::Marker("rotate".into()),
            LogEntry::Opened { plaintext_len: 1 },
        ];
        compact_entries(&mut entries);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_entries_never_carry_key_bytes() {
        let line = format_entry(&LogEntry::Init {
            mode: Mode::Seal,
            suite: "AES-256-GCM".into(),
            nonce: vec![0xFF; 12],
            aad_len: 4,
        });
        assert!(line.ends_with("INIT: mode=seal suite=AES-256-GCM nonce=//////////////// aad_len=4\n"));

        let sealed = format_entry(&LogEntry::Sealed { plaintext_len: 0, ciphertext_len: 16, tag: [0xAB; 16] });
        assert!(sealed.contains(&format!("tag=0x{}", "ab".repeat(16))));
    }

    #[test]
    fn test_sync_log_writes_through_and_replays() {
        let dir = scratch_dir("sync-log");
        let path = dir.join("events.log");
        let mut log = LogManager::new(&path, 10).unwrap();
        log.append(LogEntry::Marker("cycle-start".into())).unwrap();
        log.append(LogEntry::Opened { plaintext_len: 3 }).unwrap();
        assert_eq!(log.replay().len(), 2);

        let lines: Vec<String> = LogManager::stream_log(&path).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("MARKER: cycle-start"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_engine_events_reach_async_log() {
        let dir = scratch_dir("async-log");
        let path = dir.join("engine.log");
        let log = Arc::new(AsyncLogManager::new(&path, 1000).unwrap());

        let key = Key::generate(32);
        let mut engine = AeadEngine::for_algorithm(Algorithm::Aes256Gcm).with_event_log(log.clone());
        let sealed = engine.seal(&key, &[1u8; 12], b"aad", b"logged").unwrap();
        engine.open(&key, &[1u8; 12], b"aad", &sealed).unwrap();
        let _ = engine.open(&key, &[1u8; 12], b"bad", &sealed);

        let content = wait_for(&path, |c| c.contains("AUTH_FAILURE"));
        assert!(content.contains("INIT: mode=seal suite=AES-256-GCM"));
        assert!(content.contains("SEALED: plaintext_len=6 ciphertext_len=22"));
        assert!(content.contains("OPENED: plaintext_len=6"));
        assert!(content.contains("AUTH_FAILURE: ciphertext_len=22"));
        assert_eq!(log.path(), path.as_path());
    }

    #[test]
    fn test_config_wires_event_log() {
        let dir = scratch_dir("config-log");
        let path = dir.join("configured.log");
        let cfg = EngineConfig { event_log: Some(path.clone()), ..EngineConfig::default() };

        let mut engine = cfg.build_engine().unwrap();
        engine.init(Mode::Open, &cfg.generate_key(), &[2u8; 12], b"").unwrap();

        let content = wait_for(&path, |c| c.contains("INIT"));
        assert!(content.contains("INIT: mode=open"));
    }

    #[test]
    fn test_rotation_archives_with_zstd() {
        let dir = scratch_dir("rotate-log");
        let path = dir.join("rotating.log");
        let log = AsyncLogManager::new(&path, 2).unwrap();
        for i in 0..3 {
            log.append(LogEntry::Marker(format!("entry-{}", i)));
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        let archived = loop {
            let found = std::fs::read_dir(&dir)
                .unwrap()
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy().ends_with(".zst"));
            if found || Instant::now() > deadline {
                break found;
            }
            std::thread::sleep(Duration::from_millis(10));
        };
        assert!(archived, "expected a .zst archive in {}", dir.display());
    }

    #[test]
    fn test_drop_drains_queue_and_closes_file() {
        let dir = scratch_dir("drop-log");
        let path = dir.join("drained.log");
        let log = AsyncLogManager::new(&path, 1000).unwrap();
        for i in 0..50 {
            log.append(LogEntry::Opened { plaintext_len: i });
        }
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 50);
        if cfg!(target_os = "linux") {
            assert!(!is_open_by_us(&path));
        }
    }

    #[test]
    fn test_dropping_engine_releases_its_log() {
        let dir = scratch_dir("engine-drop-log");
        let path = dir.join("engine.log");
        let cfg = EngineConfig { event_log: Some(path.clone()), ..EngineConfig::default() };

        let mut engine = cfg.build_engine().unwrap();
        engine.seal(&cfg.generate_key(), &[3u8; 12], b"", b"bye").unwrap();
        if cfg!(target_os = "linux") {
            assert!(is_open_by_us(&path));
        }
        drop(engine);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("SEALED: plaintext_len=3"));
        if cfg!(target_os = "linux") {
            assert!(!is_open_by_us(&path));
        }
    }
}
