//! `/api/person` - customers and consultants.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use tmc_core::validation::ValidPerson;
use tmc_core::{Person, PersonId, RoleId};

use super::conversions::convert_person;
use super::types::{PersonDto, PersonRequest};
use super::{ApiError, Authorized};

const PERSON_PATH: &str = "/api/person";

/// Which kind of person a list or form manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonKind {
    Customer,
    Consultant,
}

impl PersonKind {
    /// Role id the backend stores for this kind.
    #[must_use]
    pub const fn role_id(self) -> RoleId {
        match self {
            Self::Customer => RoleId::Customer,
            Self::Consultant => RoleId::Consultant,
        }
    }

    /// Human label, singular.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Consultant => "Consultant",
        }
    }

    const fn list_path(self) -> &'static str {
        match self {
            Self::Customer => "/api/person/customers",
            Self::Consultant => "/api/person/konsulenter",
        }
    }

    const fn create_failure(self) -> &'static str {
        match self {
            Self::Customer => "Failed to create customer",
            Self::Consultant => "Failed to create konsulent",
        }
    }
}

/// A person to create.
#[derive(Debug, Clone)]
pub enum NewPerson {
    /// Customers have no password; the role is always customer.
    Customer(ValidPerson),
    /// Consultants get an initial password.
    Consultant {
        person: ValidPerson,
        password: SecretString,
    },
}

impl NewPerson {
    /// The kind of person this creates.
    #[must_use]
    pub const fn kind(&self) -> PersonKind {
        match self {
            Self::Customer(_) => PersonKind::Customer,
            Self::Consultant { .. } => PersonKind::Consultant,
        }
    }

    fn person(&self) -> &ValidPerson {
        match self {
            Self::Customer(person) | Self::Consultant { person, .. } => person,
        }
    }
}

/// Person operations the state stores depend on.
pub trait PersonApi: Send + Sync {
    /// All persons of one kind.
    fn list_people(&self, kind: PersonKind) -> impl Future<Output = Result<Vec<Person>, ApiError>> + Send;

    /// A single person by id.
    fn get_person(&self, id: PersonId) -> impl Future<Output = Result<Person, ApiError>> + Send;

    /// Create a customer or consultant.
    fn create_person(&self, new: &NewPerson) -> impl Future<Output = Result<Person, ApiError>> + Send;

    /// Update name, email and phone.
    fn update_person(
        &self,
        id: PersonId,
        kind: PersonKind,
        person: &ValidPerson,
    ) -> impl Future<Output = Result<Person, ApiError>> + Send;

    /// Delete a person. The backend refuses while they own orders.
    fn delete_person(&self, id: PersonId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl PersonApi for Authorized {
    #[instrument(skip(self))]
    async fn list_people(&self, kind: PersonKind) -> Result<Vec<Person>, ApiError> {
        let people: Vec<PersonDto> = self.get(kind.list_path()).await?;
        Ok(people.into_iter().map(convert_person).collect())
    }

    #[instrument(skip(self), fields(person_id = %id))]
    async fn get_person(&self, id: PersonId) -> Result<Person, ApiError> {
        let person: PersonDto = self.get(&format!("{PERSON_PATH}/{id}")).await?;
        Ok(convert_person(person))
    }

    #[instrument(skip(self, new), fields(kind = ?new.kind()))]
    async fn create_person(&self, new: &NewPerson) -> Result<Person, ApiError> {
        let person = new.person();
        let kind = new.kind();
        // Customers always get the customer role, whatever the caller sent.
        let mut body = PersonRequest {
            navn: &person.name,
            epost: person.email.as_str(),
            telefonnummer: person.phone.as_str(),
            role_id: kind.role_id(),
            password: None,
        };

        let path = match new {
            NewPerson::Customer(_) => PERSON_PATH.to_string(),
            NewPerson::Consultant { password, .. } => {
                body.password = Some(password.expose_secret());
                format!("{PERSON_PATH}/konsulent")
            }
        };

        let created: PersonDto = self
            .post(&path, &body)
            .await
            .map_err(|e| e.or_fallback(kind.create_failure()))?;
        Ok(convert_person(created))
    }

    #[instrument(skip(self, person), fields(person_id = %id))]
    async fn update_person(
        &self,
        id: PersonId,
        kind: PersonKind,
        person: &ValidPerson,
    ) -> Result<Person, ApiError> {
        let body = PersonRequest {
            navn: &person.name,
            epost: person.email.as_str(),
            telefonnummer: person.phone.as_str(),
            role_id: kind.role_id(),
            password: None,
        };

        let updated: PersonDto = self
            .put(&format!("{PERSON_PATH}/{id}"), &body)
            .await
            .map_err(|e| e.or_fallback("Failed to update customer"))?;
        Ok(convert_person(updated))
    }

    #[instrument(skip(self), fields(person_id = %id))]
    async fn delete_person(&self, id: PersonId) -> Result<(), ApiError> {
        self.delete(&format!("{PERSON_PATH}/{id}"))
            .await
            .map_err(|e| e.or_fallback("Failed to delete customer"))
    }
}
