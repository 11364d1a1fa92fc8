//! Builders wiring repositories into the services behind the inbound ports.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use bloodlink::domain::ports::{
    AuthenticatedIdentityDirectory, BloodRequestRepository, DonorRepository, HospitalRepository,
    IdentityDirectory, InventoryRepository, MatchQuery,
};
use bloodlink::domain::{
    AvailabilityService, InventoryLedgerService, MatchService, RequestLifecycleService,
};
use bloodlink::inbound::http::state::HttpState;
use bloodlink::outbound::change_hub::ChangeHub;
use bloodlink::outbound::memory::InMemoryStore;
use bloodlink::outbound::persistence::{
    DbPool, DieselBloodRequestRepository, DieselDonorRepository, DieselHospitalRepository,
    DieselInventoryRepository,
};

/// Driving ports shared by the HTTP and WebSocket adapters.
pub(crate) struct AdapterPorts {
    pub http: HttpState,
    pub matches: Arc<dyn MatchQuery>,
}

struct Repositories<I, H, R, D> {
    inventory: Arc<I>,
    hospitals: Arc<H>,
    requests: Arc<R>,
    donors: Arc<D>,
}

fn build_ports<I, H, R, D, Id>(
    repos: Repositories<I, H, R, D>,
    identities: Arc<Id>,
    clock: Arc<dyn Clock>,
) -> AdapterPorts
where
    I: InventoryRepository + 'static,
    H: HospitalRepository + 'static,
    R: BloodRequestRepository + 'static,
    D: DonorRepository + 'static,
    Id: IdentityDirectory + 'static,
{
    let Repositories {
        inventory,
        hospitals,
        requests,
        donors,
    } = repos;
    let lifecycle = Arc::new(RequestLifecycleService::new(
        requests.clone(),
        identities,
        clock.clone(),
    ));
    let ledger = Arc::new(InventoryLedgerService::new(inventory, hospitals, clock));
    let matches: Arc<dyn MatchQuery> = Arc::new(MatchService::new(requests.clone(), donors));

    AdapterPorts {
        http: HttpState {
            requests: lifecycle.clone(),
            requests_query: lifecycle,
            inventory: ledger.clone(),
            inventory_query: ledger,
            matches: matches.clone(),
            availability: Arc::new(AvailabilityService::new(requests)),
        },
        matches,
    }
}

/// Ports over PostgreSQL when a pool is configured, otherwise over a fresh
/// in-memory store. Both publish committed writes to `hub`.
pub(crate) fn build_adapter_ports(pool: Option<&DbPool>, hub: &ChangeHub) -> AdapterPorts {
    let identities = Arc::new(AuthenticatedIdentityDirectory);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    match pool {
        Some(pool) => build_ports(
            Repositories {
                inventory: Arc::new(DieselInventoryRepository::new(pool.clone(), hub.clone())),
                hospitals: Arc::new(DieselHospitalRepository::new(pool.clone())),
                requests: Arc::new(DieselBloodRequestRepository::new(
                    pool.clone(),
                    hub.clone(),
                )),
                donors: Arc::new(DieselDonorRepository::new(pool.clone())),
            },
            identities,
            clock,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new(hub.clone()));
            build_ports(
                Repositories {
                    inventory: store.clone(),
                    hospitals: store.clone(),
                    requests: store.clone(),
                    donors: store,
                },
                identities,
                clock,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink::domain::{BloodType, Location};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn in_memory_ports_start_empty() {
        let ports = build_adapter_ports(None, &ChangeHub::default());

        let totals = ports
            .http
            .inventory_query
            .totals_by_blood_type()
            .await
            .expect("totals");
        assert!(totals.iter().all(|total| total.units == 0));

        let matches = ports
            .matches
            .find_matches(BloodType::ONegative, &Location::new("Springfield"))
            .await
            .expect("matches");
        assert!(matches.is_empty());
    }
}
