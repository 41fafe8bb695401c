use futures::future::BoxFuture;

use crate::call::{AnnotatedCall, Call, CallFilters, NewCall};
use crate::errors::BackendError;
use crate::filter::{ShipmentFilters, SortKey, SortOrder};
use crate::shipment::{NewShipment, Shipment, ShipmentPatch};
use crate::stats::Stats;

/// Record counts for introspection.
#[derive(Clone, Copy, Debug)]
pub struct Counts {
    pub shipments: usize,
    pub phone_calls: usize,
}

/// The authoritative owner of all shipment and call records.
///
/// Identifier arguments accept either the internal ID or the
/// human-readable load ID; automated callers hold the former, human
/// operators the latter, and neither should have to care which.
pub trait Ledger {
    /// Creates a record. Fails when the load ID is already taken by a
    /// live record (exact, case-sensitive match).
    fn create(
        &self,
        data: NewShipment,
        via_url: bool,
    ) -> BoxFuture<Result<Shipment, BackendError>>;

    fn retrieve(&self, identifier: String) -> BoxFuture<Result<Shipment, BackendError>>;

    fn list(
        &self,
        filters: ShipmentFilters,
        sort_by: SortKey,
        sort_order: SortOrder,
    ) -> BoxFuture<Result<Vec<Shipment>, BackendError>>;

    /// Merges the supplied fields into the record, re-validates the
    /// result and tags the assignment source. All-or-nothing.
    fn update(
        &self,
        identifier: String,
        patch: ShipmentPatch,
        via_url: bool,
    ) -> BoxFuture<Result<Shipment, BackendError>>;

    /// Removes the record and every call it owns.
    fn delete(&self, identifier: String) -> BoxFuture<Result<(), BackendError>>;

    /// Picks uniformly among pending records, optionally restricted by
    /// an origin substring.
    fn random_pending(&self, origin: Option<String>)
        -> BoxFuture<Result<Shipment, BackendError>>;

    /// Appends a call to the shipment, preserving insertion order.
    fn add_call(&self, identifier: String, data: NewCall)
        -> BoxFuture<Result<Call, BackendError>>;

    fn calls(&self, identifier: String) -> BoxFuture<Result<Vec<Call>, BackendError>>;

    /// Removes every call owned by the shipment. Not an error when there
    /// are none.
    fn clear_calls(&self, identifier: String) -> BoxFuture<Result<(), BackendError>>;

    /// Every call across every shipment, annotated with its owner's
    /// display fields, newest first.
    fn all_calls(
        &self,
        filters: CallFilters,
    ) -> BoxFuture<Result<Vec<AnnotatedCall>, BackendError>>;

    fn stats(&self, filters: ShipmentFilters) -> BoxFuture<Result<Stats, BackendError>>;

    fn counts(&self) -> BoxFuture<Result<Counts, BackendError>>;
}

pub use self::memory::MemoryLedger;

mod memory {
    use std::collections::HashMap;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use rand::seq::SliceRandom;
    use time::OffsetDateTime;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use crate::call::{AnnotatedCall, Call, CallFilters, NewCall};
    use crate::config::{DEFAULT_API_SECONDS_PER_CALL, DEFAULT_MANUAL_SECONDS_PER_CALL};
    use crate::errors::BackendError;
    use crate::filter::{self, ShipmentFilters, SortKey, SortOrder};
    use crate::shipment::{self, NewShipment, Shipment, ShipmentPatch, Status};
    use crate::stats::{self, Stats};

    use super::Counts;

    struct Entry {
        shipment: Shipment,
        calls: Vec<Call>,

        /// Creation rank. Snapshots are handed to the query engine in
        /// this order so that stable sorts tie-break by insertion.
        seq: u64,
    }

    #[derive(Default)]
    struct Inner {
        entries: HashMap<Uuid, Entry>,
        next_seq: u64,
    }

    impl Inner {
        fn resolve(&self, identifier: &str) -> Result<Uuid, BackendError> {
            if let Ok(id) = Uuid::parse_str(identifier) {
                if self.entries.contains_key(&id) {
                    return Ok(id);
                }
            }

            self.entries
                .values()
                .find(|entry| entry.shipment.load_id == identifier)
                .map(|entry| entry.shipment.id)
                .ok_or_else(|| BackendError::not_found(identifier))
        }

        fn load_id_taken(&self, load_id: &str, excluding: Option<&Uuid>) -> bool {
            self.entries.values().any(|entry| {
                entry.shipment.load_id == load_id && Some(&entry.shipment.id) != excluding
            })
        }

        fn ordered(&self) -> Vec<&Entry> {
            let mut entries: Vec<&Entry> = self.entries.values().collect();
            entries.sort_by_key(|entry| entry.seq);
            entries
        }

        fn snapshot(&self) -> Vec<Shipment> {
            self.ordered()
                .into_iter()
                .map(|entry| entry.shipment.clone())
                .collect()
        }

        fn snapshot_with_calls(&self) -> Vec<(Shipment, Vec<Call>)> {
            self.ordered()
                .into_iter()
                .map(|entry| (entry.shipment.clone(), entry.calls.clone()))
                .collect()
        }
    }

    /// The process-wide shipment ledger. A single lock serializes
    /// mutations against each other so that the uniqueness check in
    /// `create` and the merge-then-validate in `update` are atomic;
    /// reads share the lock and never block one another.
    #[derive(Default)]
    pub struct MemoryLedger {
        inner: RwLock<Inner>,
    }

    impl MemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl super::Ledger for MemoryLedger {
        fn create(
            &self,
            data: NewShipment,
            via_url: bool,
        ) -> BoxFuture<Result<Shipment, BackendError>> {
            async move {
                let mut inner = self.inner.write().await;

                let shipment = data.into_shipment(via_url, OffsetDateTime::now_utc());
                shipment::validate(&shipment)?;

                if inner.load_id_taken(&shipment.load_id, None) {
                    return Err(BackendError::LoadIdExists {
                        load_id: shipment.load_id,
                    });
                }

                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.entries.insert(
                    shipment.id,
                    Entry {
                        shipment: shipment.clone(),
                        calls: vec![],
                        seq,
                    },
                );

                Ok(shipment)
            }
            .boxed()
        }

        fn retrieve(&self, identifier: String) -> BoxFuture<Result<Shipment, BackendError>> {
            async move {
                let inner = self.inner.read().await;
                let id = inner.resolve(&identifier)?;

                Ok(inner.entries[&id].shipment.clone())
            }
            .boxed()
        }

        fn list(
            &self,
            filters: ShipmentFilters,
            sort_by: SortKey,
            sort_order: SortOrder,
        ) -> BoxFuture<Result<Vec<Shipment>, BackendError>> {
            async move {
                let snapshot = self.inner.read().await.snapshot();

                Ok(filter::query(snapshot, &filters, sort_by, sort_order))
            }
            .boxed()
        }

        fn update(
            &self,
            identifier: String,
            patch: ShipmentPatch,
            via_url: bool,
        ) -> BoxFuture<Result<Shipment, BackendError>> {
            async move {
                let mut inner = self.inner.write().await;
                let id = inner.resolve(&identifier)?;

                let mut updated = inner.entries[&id].shipment.clone();
                patch.apply(&mut updated);

                // Assignment tracking: the entry point, not the payload,
                // decides the source of the change.
                updated.assigned_via_url = via_url;

                if let Some(Some(seconds)) = patch.time_per_call_seconds {
                    updated.avg_time_per_call_seconds = Some(seconds);
                } else if patch.status == Some(Status::Agreed)
                    && updated.avg_time_per_call_seconds.is_none()
                {
                    // Fallback so historical reports stay populated; a
                    // provisional figure, not a measurement.
                    updated.avg_time_per_call_seconds = Some(if via_url {
                        DEFAULT_API_SECONDS_PER_CALL
                    } else {
                        DEFAULT_MANUAL_SECONDS_PER_CALL
                    });
                }

                updated.times.updated_at = OffsetDateTime::now_utc();

                shipment::validate(&updated)?;

                if inner.load_id_taken(&updated.load_id, Some(&id)) {
                    return Err(BackendError::LoadIdExists {
                        load_id: updated.load_id,
                    });
                }

                let entry = inner
                    .entries
                    .get_mut(&id)
                    .expect("entry disappeared under the write lock");
                entry.shipment = updated.clone();

                Ok(updated)
            }
            .boxed()
        }

        fn delete(&self, identifier: String) -> BoxFuture<Result<(), BackendError>> {
            async move {
                let mut inner = self.inner.write().await;
                let id = inner.resolve(&identifier)?;

                // Owned calls go down with the record.
                inner.entries.remove(&id);

                Ok(())
            }
            .boxed()
        }

        fn random_pending(
            &self,
            origin: Option<String>,
        ) -> BoxFuture<Result<Shipment, BackendError>> {
            async move {
                let filters = ShipmentFilters {
                    status: Some(Status::Pending),
                    origin,
                    ..ShipmentFilters::default()
                };

                let inner = self.inner.read().await;
                let candidates: Vec<&Entry> = inner
                    .ordered()
                    .into_iter()
                    .filter(|entry| filters.matches(&entry.shipment))
                    .collect();

                candidates
                    .choose(&mut rand::thread_rng())
                    .map(|entry| entry.shipment.clone())
                    .ok_or_else(|| BackendError::not_found("random"))
            }
            .boxed()
        }

        fn add_call(
            &self,
            identifier: String,
            data: NewCall,
        ) -> BoxFuture<Result<Call, BackendError>> {
            async move {
                let mut inner = self.inner.write().await;
                let id = inner.resolve(&identifier)?;

                let now = OffsetDateTime::now_utc();
                let call = data.into_call(id, now)?;

                let entry = inner
                    .entries
                    .get_mut(&id)
                    .expect("entry disappeared under the write lock");
                entry.calls.push(call.clone());
                entry.shipment.times.updated_at = now;

                Ok(call)
            }
            .boxed()
        }

        fn calls(&self, identifier: String) -> BoxFuture<Result<Vec<Call>, BackendError>> {
            async move {
                let inner = self.inner.read().await;
                let id = inner.resolve(&identifier)?;

                Ok(inner.entries[&id].calls.clone())
            }
            .boxed()
        }

        fn clear_calls(&self, identifier: String) -> BoxFuture<Result<(), BackendError>> {
            async move {
                let mut inner = self.inner.write().await;
                let id = inner.resolve(&identifier)?;

                let entry = inner
                    .entries
                    .get_mut(&id)
                    .expect("entry disappeared under the write lock");

                if !entry.calls.is_empty() {
                    entry.calls.clear();
                    entry.shipment.times.updated_at = OffsetDateTime::now_utc();
                }

                Ok(())
            }
            .boxed()
        }

        fn all_calls(
            &self,
            filters: CallFilters,
        ) -> BoxFuture<Result<Vec<AnnotatedCall>, BackendError>> {
            async move {
                let inner = self.inner.read().await;

                let mut annotated: Vec<AnnotatedCall> = inner
                    .ordered()
                    .into_iter()
                    .flat_map(|entry| {
                        entry
                            .calls
                            .iter()
                            .filter(|call| filters.matches(call))
                            .map(move |call| AnnotatedCall {
                                call: call.clone(),
                                load_id: entry.shipment.load_id.clone(),
                                origin: entry.shipment.origin.clone(),
                                destination: entry.shipment.destination.clone(),
                            })
                    })
                    .collect();

                annotated.sort_by(|a, b| b.call.created_at.cmp(&a.call.created_at));

                Ok(annotated)
            }
            .boxed()
        }

        fn stats(&self, filters: ShipmentFilters) -> BoxFuture<Result<Stats, BackendError>> {
            async move {
                let records: Vec<_> = self
                    .inner
                    .read()
                    .await
                    .snapshot_with_calls()
                    .into_iter()
                    .filter(|(shipment, _)| filters.matches(shipment))
                    .collect();

                Ok(stats::aggregate(&records))
            }
            .boxed()
        }

        fn counts(&self) -> BoxFuture<Result<Counts, BackendError>> {
            async move {
                let inner = self.inner.read().await;

                Ok(Counts {
                    shipments: inner.entries.len(),
                    phone_calls: inner.entries.values().map(|entry| entry.calls.len()).sum(),
                })
            }
            .boxed()
        }
    }

}
