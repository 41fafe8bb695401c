use url::Url;
use uuid::Uuid;

/// Convenience wrapper for URL generation functions.
#[derive(Clone)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,

    /// Path for all shipments-related actions.
    pub(crate) shipments_path: String,

    /// Prefix for all shipments-related actions.
    shipments_prefix: String,
}

impl Urls {
    /// Create a new instance. `shipments_prefix` should *not* include a
    /// trailing slash.
    pub fn new(base: impl AsRef<str>, shipments_prefix: impl Into<String>) -> Self {
        let base =
            Url::parse(base.as_ref()).unwrap_or_else(|_| panic!("parse {} as URL", base.as_ref()));
        let shipments_path = shipments_prefix.into();
        let shipments_prefix = format!("{}/", shipments_path);

        Urls {
            base,
            shipments_path,
            shipments_prefix,
        }
    }

    pub fn shipments(&self) -> Url {
        self.base
            .join(&self.shipments_prefix)
            .expect("get shipments URL")
    }

    pub fn shipment(&self, id: &Uuid) -> Url {
        let id = format!("{}", id);
        self.shipments()
            .join(&id)
            .unwrap_or_else(|_| panic!("get URL for shipment {}", id))
    }
}
