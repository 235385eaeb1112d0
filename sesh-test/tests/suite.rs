use sesh::store::{MemoryCache, MemoryDatastore};
use sesh_test::{cache_test_suite, datastore_test_suite};

mod memory_cache {
    use super::*;

    cache_test_suite! {
        store: MemoryCache::new(),
    }
}

mod memory_datastore {
    use super::*;

    datastore_test_suite! {
        store: MemoryDatastore::new(),
    }
}
