// SPDX-License-Identifier: AGPL-3.0-or-later

//! Storage-agnostic source of the release stream fed to
//! `catcache_core::classifier::ClassifierPipeline`.

use catcache_core::classifier::ClassifierInput;

use crate::error::Result;

/// Loads every release eligible for classification.
///
/// Joins on `extra = 0` (primary artist only), excluding extra-only
/// releases entirely rather than attempting to classify them against a
/// secondary credit — carried over as observed from the original pipeline's
/// release-loading query.
pub trait ClassificationSource {
    fn load_releases_for_classification(&mut self) -> Result<Vec<ClassifierInput>>;
}

#[cfg(test)]
mod tests {
    use super::ClassificationSource;
    use crate::error::Result;
    use catcache_core::classifier::ClassifierInput;

    struct FakeSource(Vec<ClassifierInput>);

    impl ClassificationSource for FakeSource {
        fn load_releases_for_classification(&mut self) -> Result<Vec<ClassifierInput>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn returns_loaded_releases() {
        let mut source = FakeSource(vec![ClassifierInput {
            release_id: 1,
            raw_artist: "Joy Division".into(),
            raw_title: "Closer".into(),
        }]);
        let releases = source.load_releases_for_classification().expect("load");
        assert_eq!(releases.len(), 1);
    }
}
