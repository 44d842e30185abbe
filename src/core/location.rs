use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use tracing::{debug, warn};
use crate::core::error::LocationError;
use crate::data::geocoder::Geocoder;
use crate::data::poi::Site;
use crate::models::asset::SiteRef;

/// Memoizing front of a geocoder. Every distinct name is looked up at most
/// once; failures are cached as well as hits.
pub struct LocationResolver {
    geocoder: Box<dyn Geocoder>,
    cache: Mutex<HashMap<String, Result<Site, LocationError>>>,
    lookups: AtomicUsize,
}

impl LocationResolver {
    pub fn new(geocoder: Box<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            cache: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Site, LocationError> {
        let key = name.trim();
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(key) {
            return cached.clone();
        }

        self.lookups.fetch_add(1, Ordering::SeqCst);
        let result = self.geocoder.geocode(key).map(|coordinate| Site::new(key, coordinate));
        match &result {
            Ok(site) => debug!(site = key, latitude = site.latitude(), longitude = site.longitude(), "Resolved site"),
            Err(e) => warn!(site = key, error = %e, "Site resolution failed"),
        }
        cache.insert(key.to_string(), result.clone());
        result
    }

    /// Explicit coordinates bypass the geocoder.
    pub fn resolve_ref(&self, site: &SiteRef) -> Result<Site, LocationError> {
        match site.fixed_site() {
            Some(fixed) => Ok(fixed),
            None => self.resolve(&site.key()),
        }
    }

    /// Number of lookups forwarded to the geocoder.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::data::geocoder::Gazetteer;
    use crate::data::poi::Coordinate;

    struct Counting {
        inner: Gazetteer,
        calls: Arc<AtomicUsize>,
    }

    impl Geocoder for Counting {
        fn geocode(&self, name: &str) -> Result<Coordinate, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.geocode(name)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn resolver() -> (LocationResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let geocoder = Counting { inner: Gazetteer::builtin(), calls: Arc::clone(&calls) };
        (LocationResolver::new(Box::new(geocoder)), calls)
    }

    #[test]
    fn second_resolution_hits_cache() {
        let (r, calls) = resolver();
        let first = r.resolve("Berlin").expect("known site");
        let second = r.resolve("Berlin").expect("known site");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.lookups(), 1);
    }

    #[test]
    fn misses_are_memoized_too() {
        let (r, calls) = resolver();
        assert!(r.resolve("Atlantis").is_err());
        assert!(r.resolve("Atlantis").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.cached(), 1);
    }

    #[test]
    fn coordinates_skip_the_geocoder() {
        let (r, calls) = resolver();
        let site = r.resolve_ref(&SiteRef::Coordinates {
            name: Some("Offshore".to_string()),
            latitude: 54.0,
            longitude: 7.0,
        }).expect("coordinates given");
        assert_eq!(site.name, "Offshore");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolved_site_keeps_requested_name() {
        let (r, _) = resolver();
        let site = r.resolve_ref(&SiteRef::Name(" Kiel ".to_string())).expect("known site");
        assert_eq!(site.name, "Kiel");
    }
}
