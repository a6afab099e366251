use crate::db::CalendarStore;
use crate::errors::AppError;
use crate::models::listing::infer_category;
use crate::models::{BusinessListing, ServiceListing};

/// Active businesses with their active services, optionally narrowed by
/// category name ("All" matches everything) and a name substring.
pub fn business_listings<S>(
    store: &S,
    category: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<BusinessListing>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
    let search = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut listings = vec![];
    for business in store.list_businesses()? {
        if !business.active {
            continue;
        }

        let inferred = infer_category(&business.name, business.description.as_deref());
        if let Some(wanted) = category {
            if !inferred.as_str().eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        if let Some(needle) = &search {
            if !business.name.to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }

        let services = store
            .list_services_for_business(business.id)?
            .into_iter()
            .filter(|s| s.active)
            .map(|s| ServiceListing {
                id: s.id,
                name: s.name,
                duration_minutes: s.duration_minutes,
                price: s.price,
            })
            .collect();

        listings.push(BusinessListing {
            id: business.id,
            name: business.name,
            category: inferred,
            services,
        });
    }

    Ok(listings)
}
