use std::fmt;

/// Named collections in the agency database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    Admins,
    /// Orders placed against a service (`/order`, `/getOrders`, `/updateStatus`).
    ServiceRegistrations,
    /// Sign-ups from `/registration`; kept apart from orders.
    Registrations,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Services,
        Collection::Admins,
        Collection::ServiceRegistrations,
        Collection::Registrations,
        Collection::Reviews,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Admins => "admins",
            Collection::ServiceRegistrations => "serviceRegistration",
            Collection::Registrations => "registration",
            Collection::Reviews => "reviews",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
