//! The Exporter (§4.4): turns fetched descriptors into files under a
//! schema-partitioned directory tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Mutex as AsyncMutex, OnceCell};
use tokio_util::sync::CancellationToken;

use crate::engine::error::EngineError;
use crate::engine::types::{ErrorPolicy, ObjectDescriptor, ObjectType};

/// One file this export run must write, already positioned in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Computes the file placement for every descriptor that has a
/// `definition`, per the layout rules in §4.4. Pure — no filesystem access,
/// so it's exercised directly in unit tests.
pub fn plan(output_root: &Path, descriptors: &[ObjectDescriptor]) -> Vec<PlannedFile> {
    descriptors
        .iter()
        .filter_map(|descriptor| descriptor.definition.as_ref().map(|def| (descriptor, def)))
        .map(|(descriptor, definition)| PlannedFile {
            path: path_for(output_root, descriptor),
            contents: definition.clone(),
        })
        .collect()
}

fn path_for(output_root: &Path, descriptor: &ObjectDescriptor) -> PathBuf {
    let schema_dir = output_root.join(&descriptor.schema);

    match descriptor.object_type {
        ObjectType::Table => schema_dir
            .join("tables")
            .join(&descriptor.name)
            .join("table.sql"),

        ObjectType::Trigger
        | ObjectType::Index
        | ObjectType::Constraint
        | ObjectType::Policy
        | ObjectType::Rule
        | ObjectType::Sequence => match &descriptor.owning_table {
            Some(table) => schema_dir
                .join("tables")
                .join(table)
                .join(descriptor.object_type.plural_dir_name())
                .join(format!("{}.sql", descriptor.name)),
            None => {
                if descriptor.object_type.expects_owning_table() {
                    tracing::warn!(
                        object = %descriptor.qualified_name(),
                        object_type = ?descriptor.object_type,
                        "object has no owning table; placing standalone"
                    );
                }
                schema_dir
                    .join(descriptor.object_type.plural_dir_name())
                    .join(format!("{}.sql", descriptor.name))
            }
        },

        ObjectType::View
        | ObjectType::MaterializedView
        | ObjectType::Function
        | ObjectType::Procedure
        | ObjectType::Aggregate
        | ObjectType::Extension => schema_dir
            .join(descriptor.object_type.plural_dir_name())
            .join(format!("{}.sql", descriptor.name)),

        ObjectType::Publication | ObjectType::Subscription => output_root
            .join(crate::engine::types::DATABASE_WIDE_SCHEMA)
            .join(descriptor.object_type.plural_dir_name())
            .join(format!("{}.sql", descriptor.name)),
    }
}

/// Get-or-insert directory-creation serializer (§4.4): prevents two writer
/// tasks from racing on the same `create_dir_all` call.
#[derive(Default)]
struct DirLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl DirLocks {
    async fn ensure_dir(&self, path: &Path) -> std::io::Result<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(
                locks
                    .entry(path.to_path_buf())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        let _guard = lock.lock().await;
        if tokio::fs::metadata(path).await.is_ok() {
            return Ok(());
        }
        tokio::fs::create_dir_all(path).await?;
        set_dir_permissions(path).await;
        Ok(())
    }
}

#[cfg(unix)]
async fn set_dir_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await;
}

#[cfg(not(unix))]
async fn set_dir_permissions(_path: &Path) {}

#[cfg(unix)]
async fn set_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)).await;
}

#[cfg(not(unix))]
async fn set_file_permissions(_path: &Path) {}

/// Writes every planned file through a bounded pool of `c_fs` workers,
/// escalating per `policy`.
pub async fn write_all(
    files: Vec<PlannedFile>,
    c_fs: usize,
    policy: ErrorPolicy,
    cancel: CancellationToken,
) -> Result<usize, EngineError> {
    if files.is_empty() {
        return Ok(0);
    }

    let worker_count = c_fs.max(1).min(files.len());
    let (tx, rx) = mpsc::channel::<PlannedFile>(files.len());
    let rx = Arc::new(AsyncMutex::new(rx));
    let dir_locks = Arc::new(DirLocks::default());
    let written = Arc::new(AtomicUsize::new(0));
    let warn_count = Arc::new(AtomicUsize::new(0));
    let first_error: Arc<OnceCell<EngineError>> = Arc::new(OnceCell::new());

    for file in files {
        // Unbounded by channel capacity (sized to the full batch), so this
        // never blocks; the bound on concurrency lives in `worker_count`.
        let _ = tx.send(file).await;
    }
    drop(tx);

    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let rx = Arc::clone(&rx);
        let dir_locks = Arc::clone(&dir_locks);
        let written = Arc::clone(&written);
        let warn_count = Arc::clone(&warn_count);
        let first_error = Arc::clone(&first_error);
        let cancel = cancel.clone();

        workers.push(tokio::spawn(async move {
            loop {
                let next = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let Some(file) = next else { break };

                if cancel.is_cancelled() {
                    continue;
                }

                match write_one(&file, &dir_locks).await {
                    Ok(()) => {
                        written.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => {
                        tracing::warn!(path = %file.path.display(), error = %err, "failed to write file");
                        warn_count.fetch_add(1, Ordering::SeqCst);
                        let _ = first_error
                            .set(EngineError::Write {
                                path: file.path.clone(),
                                source: err,
                            })
                            .ok();
                    }
                }
            }
        }));
    }

    for worker in workers {
        let _ = worker.await;
    }

    match policy {
        ErrorPolicy::FailFast => {
            if let Some(err) = Arc::try_unwrap(first_error).ok().and_then(|cell| cell.into_inner()) {
                return Err(err);
            }
            Ok(written.load(Ordering::SeqCst))
        }
        ErrorPolicy::ContinueOnWarning => {
            let n = warn_count.load(Ordering::SeqCst);
            if n > 0 {
                tracing::info!(errors = n, "encountered {n} errors, continuing");
            }
            Ok(written.load(Ordering::SeqCst))
        }
    }
}

async fn write_one(file: &PlannedFile, dir_locks: &DirLocks) -> std::io::Result<()> {
    if let Some(parent) = file.path.parent() {
        dir_locks.ensure_dir(parent).await?;
    }
    tokio::fs::write(&file.path, &file.contents).await?;
    set_file_permissions(&file.path).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(
        object_type: ObjectType,
        schema: &str,
        name: &str,
        owning_table: Option<&str>,
        definition: Option<&str>,
    ) -> ObjectDescriptor {
        ObjectDescriptor {
            object_type,
            schema: schema.to_string(),
            name: name.to_string(),
            owning_table: owning_table.map(str::to_string),
            definition: definition.map(str::to_string),
        }
    }

    #[test]
    fn table_gets_its_own_directory() {
        let descriptors = vec![descriptor(
            ObjectType::Table,
            "public",
            "users",
            None,
            Some("CREATE TABLE public.users ();"),
        )];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].path, PathBuf::from("/out/public/tables/users/table.sql"));
    }

    #[test]
    fn owned_object_nests_under_owning_table() {
        let descriptors = vec![descriptor(
            ObjectType::Index,
            "public",
            "users_email_idx",
            Some("users"),
            Some("CREATE INDEX users_email_idx ON public.users (email);"),
        )];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_eq!(
            planned[0].path,
            PathBuf::from("/out/public/tables/users/indexes/users_email_idx.sql")
        );
    }

    #[test]
    fn owned_object_without_owning_table_falls_back_to_standalone() {
        let descriptors = vec![descriptor(
            ObjectType::Sequence,
            "public",
            "report_seq",
            None,
            Some("CREATE SEQUENCE public.report_seq;"),
        )];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_eq!(planned[0].path, PathBuf::from("/out/public/sequences/report_seq.sql"));
    }

    #[test]
    fn standalone_object_types_go_under_schema() {
        let descriptors = vec![descriptor(
            ObjectType::View,
            "app",
            "active_users",
            None,
            Some("CREATE VIEW app.active_users AS SELECT 1;"),
        )];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_eq!(planned[0].path, PathBuf::from("/out/app/views/active_users.sql"));
    }

    #[test]
    fn database_wide_objects_land_under_synthetic_postgres_schema() {
        let descriptors = vec![descriptor(
            ObjectType::Publication,
            "postgres",
            "all_tables_pub",
            None,
            Some("CREATE PUBLICATION all_tables_pub FOR ALL TABLES;"),
        )];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_eq!(
            planned[0].path,
            PathBuf::from("/out/postgres/publications/all_tables_pub.sql")
        );
    }

    #[test]
    fn descriptors_without_definition_are_dropped() {
        let descriptors = vec![descriptor(ObjectType::Table, "public", "pending", None, None)];
        let planned = plan(Path::new("/out"), &descriptors);
        assert!(planned.is_empty());
    }

    #[test]
    fn different_schemas_produce_disjoint_paths() {
        let descriptors = vec![
            descriptor(ObjectType::Table, "s1", "t", None, Some("CREATE TABLE s1.t ();")),
            descriptor(ObjectType::Table, "s2", "t", None, Some("CREATE TABLE s2.t ();")),
        ];
        let planned = plan(Path::new("/out"), &descriptors);
        assert_ne!(planned[0].path, planned[1].path);
    }

    #[tokio::test]
    async fn write_all_creates_files_and_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        let descriptors = vec![
            descriptor(
                ObjectType::Table,
                "public",
                "users",
                None,
                Some("CREATE TABLE public.users ();"),
            ),
            descriptor(
                ObjectType::View,
                "public",
                "active_users",
                None,
                Some("CREATE VIEW public.active_users AS SELECT 1;"),
            ),
        ];
        let planned = plan(dir.path(), &descriptors);
        let written = write_all(planned, 4, ErrorPolicy::FailFast, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("public/tables/users/table.sql").exists());
        assert!(dir.path().join("public/views/active_users.sql").exists());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_race_on_shared_ancestor_directories() {
        let dir = tempfile::tempdir().unwrap();
        let descriptors: Vec<_> = (0..40)
            .map(|i| {
                descriptor(
                    ObjectType::Index,
                    "public",
                    &format!("idx_{i}"),
                    Some("users"),
                    Some("CREATE INDEX idx ON public.users (id);"),
                )
            })
            .collect();
        let planned = plan(dir.path(), &descriptors);
        let written = write_all(planned, 16, ErrorPolicy::ContinueOnWarning, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(written, 40);
    }
}
