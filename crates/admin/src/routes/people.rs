//! Customer and consultant management.
//!
//! The same handlers serve three sections: customers and consultants under
//! `/admin`, and customers under `/konsulent`. A [`PeopleSection`] fixes the
//! role allowed in, the kind of person managed and the base path.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use tmc_core::validation::{PersonErrors, PersonInput, validate_new_password, validate_person};
use tmc_core::{Person, PersonId};

use super::{Flash, LayoutView, inline_failure, load_failure, redirect_failure, redirect_with, render, render_invalid};
use crate::backend::{NewPerson, PersonKind};
use crate::components::data_table::{ListQuery, Page, TableColumn, domain_options, paginate, people_columns};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, ConsultantArea, RequireRole, RoleArea};
use crate::state::AppState;
use crate::stores::PersonStore;

/// One people-management section of the site.
pub trait PeopleSection: Send + Sync + 'static {
    type Area: RoleArea;
    const KIND: PersonKind;
    const BASE: &'static str;
    const TITLE: &'static str;
}

/// `/admin/customers`
pub struct AdminCustomers;

impl PeopleSection for AdminCustomers {
    type Area = AdminArea;
    const KIND: PersonKind = PersonKind::Customer;
    const BASE: &'static str = "/admin/customers";
    const TITLE: &'static str = "Customer Management";
}

/// `/admin/konsulent`
pub struct AdminConsultants;

impl PeopleSection for AdminConsultants {
    type Area = AdminArea;
    const KIND: PersonKind = PersonKind::Consultant;
    const BASE: &'static str = "/admin/konsulent";
    const TITLE: &'static str = "Consultant Management";
}

/// `/konsulent/customers`
pub struct ConsultantCustomers;

impl PeopleSection for ConsultantCustomers {
    type Area = ConsultantArea;
    const KIND: PersonKind = PersonKind::Customer;
    const BASE: &'static str = "/konsulent/customers";
    const TITLE: &'static str = "Customer Management";
}

/// Build the router for one section.
pub fn router<P: PeopleSection>() -> Router<AppState> {
    let base = P::BASE;
    Router::new()
        .route(base, get(index::<P>))
        .route(&format!("{base}/new"), get(new_form::<P>).post(create::<P>))
        .route(&format!("{base}/{{id}}"), get(show::<P>))
        .route(&format!("{base}/{{id}}/edit"), get(edit_form::<P>).post(update::<P>))
        .route(&format!("{base}/{{id}}/delete"), get(delete_confirm::<P>).post(delete::<P>))
}

// =============================================================================
// Templates
// =============================================================================

/// People list template.
#[derive(Template)]
#[template(path = "people/index.html")]
pub struct PeopleIndexTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub title: &'static str,
    pub singular: &'static str,
    pub base: &'static str,
    pub page: Page<Person>,
    pub query: ListQuery,
    pub columns: Vec<TableColumn>,
    pub domains: Vec<String>,
    pub error: Option<String>,
}

/// Create/edit form template.
#[derive(Template)]
#[template(path = "people/form.html")]
pub struct PersonFormTemplate {
    pub layout: LayoutView,
    pub title: String,
    pub base: &'static str,
    pub action: String,
    pub form: PersonInput,
    pub errors: PersonErrors,
    /// Consultant creation only.
    pub show_password: bool,
    pub password_error: Option<&'static str>,
    /// Form-level message (missing fields or backend failure).
    pub error: Option<String>,
}

/// Detail page template.
#[derive(Template)]
#[template(path = "people/show.html")]
pub struct PersonShowTemplate {
    pub layout: LayoutView,
    pub flash: Flash,
    pub singular: &'static str,
    pub base: &'static str,
    pub person: Person,
}

/// Delete confirmation template.
#[derive(Template)]
#[template(path = "people/delete.html")]
pub struct PersonDeleteTemplate {
    pub layout: LayoutView,
    pub singular: &'static str,
    pub base: &'static str,
    pub person: Person,
}

/// Posted create/edit form.
#[derive(Debug, Default, Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: Option<String>,
}

impl PersonForm {
    fn input(&self) -> PersonInput {
        PersonInput {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

fn missing_fields_message(kind: PersonKind, form: &PersonForm) -> Option<&'static str> {
    let blank = [&form.name, &form.email, &form.phone]
        .iter()
        .any(|field| field.trim().is_empty());
    let password_blank = kind == PersonKind::Consultant
        && form.password.as_deref().is_none_or(|p| p.trim().is_empty());

    match kind {
        PersonKind::Customer if blank => Some("Name, email, and phone are required."),
        PersonKind::Consultant if blank || password_blank => Some("All fields are required"),
        _ => None,
    }
}

fn plural(kind: PersonKind) -> &'static str {
    match kind {
        PersonKind::Customer => "Customers",
        PersonKind::Consultant => "Consultants",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List page.
#[instrument(skip_all, fields(base = P::BASE))]
pub async fn index<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(flash): Query<Flash>,
) -> Result<Response, AppError> {
    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    let error = match store.fetch_all().await {
        Ok(()) => None,
        Err(e) => Some(inline_failure(&e)?),
    };
    let people = store.snapshot().await.items;

    let template = PeopleIndexTemplate {
        layout: LayoutView::new(&user, P::BASE),
        flash,
        title: plural(P::KIND),
        singular: P::KIND.label(),
        base: P::BASE,
        page: paginate(&people, &query),
        domains: domain_options(&people),
        query,
        columns: people_columns(),
        error,
    };

    Ok(render(&template).into_response())
}

/// Empty create form.
pub async fn new_form<P: PeopleSection>(RequireRole(user, _): RequireRole<P::Area>) -> Response {
    let template = PersonFormTemplate {
        layout: LayoutView::new(&user, P::BASE),
        title: format!("New {}", P::KIND.label()),
        base: P::BASE,
        action: format!("{}/new", P::BASE),
        form: PersonInput::default(),
        errors: PersonErrors::default(),
        show_password: P::KIND == PersonKind::Consultant,
        password_error: None,
        error: None,
    };
    render(&template).into_response()
}

/// Create a person.
#[instrument(skip_all, fields(base = P::BASE))]
pub async fn create<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Form(form): Form<PersonForm>,
) -> Result<Response, AppError> {
    let input = form.input();
    let validated = validate_person(&input);
    let password_error = match (P::KIND, form.password.as_deref()) {
        (PersonKind::Consultant, password) => validate_new_password(password.unwrap_or_default()).err(),
        (PersonKind::Customer, _) => None,
    };

    let mut template = PersonFormTemplate {
        layout: LayoutView::new(&user, P::BASE),
        title: format!("New {}", P::KIND.label()),
        base: P::BASE,
        action: format!("{}/new", P::BASE),
        form: input,
        errors: PersonErrors::default(),
        show_password: P::KIND == PersonKind::Consultant,
        password_error,
        error: missing_fields_message(P::KIND, &form).map(str::to_string),
    };

    let person = match validated {
        Ok(person) if template.password_error.is_none() => person,
        Ok(_) => return Ok(render_invalid(&template)),
        Err(errors) => {
            template.errors = errors;
            return Ok(render_invalid(&template));
        }
    };

    let new = match P::KIND {
        PersonKind::Customer => NewPerson::Customer(person),
        PersonKind::Consultant => NewPerson::Consultant {
            person,
            password: SecretString::from(form.password.unwrap_or_default()),
        },
    };

    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    match store.create(&new).await {
        Ok(created) => Ok(redirect_with(
            &format!("{}/{}", P::BASE, created.id),
            &Flash::success(format!("{} created successfully", P::KIND.label())),
        )),
        Err(e) => {
            template.error = Some(inline_failure(&e)?);
            Ok(render_invalid(&template))
        }
    }
}

/// Whether `person` is managed under this section.
fn in_section<P: PeopleSection>(person: &Person) -> bool {
    person.role_id == P::KIND.role_id()
}

/// Load a person of this section's kind.
///
/// A person of another role goes back to the list; backend failures are
/// handled by [`load_failure`].
///
/// Every handler touching an existing person goes through here, so a
/// section never reads or writes a person of another role.
async fn load<P: PeopleSection>(
    store: &PersonStore<crate::backend::Authorized>,
    id: PersonId,
) -> Result<Result<Person, Response>, AppError> {
    match store.fetch_by_id(id).await {
        Ok(person) if in_section::<P>(&person) => Ok(Ok(person)),
        Ok(person) => {
            tracing::warn!(person_id = %id, role_id = ?person.role_id, "Person is not in this section");
            Ok(Err(redirect_with(
                P::BASE,
                &Flash::error(format!("{} not found", P::KIND.label())),
            )))
        }
        Err(e) => load_failure(P::BASE, e).map(Err),
    }
}

/// Detail page.
#[instrument(skip_all, fields(base = P::BASE, person_id = %id))]
pub async fn show<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
    Query(flash): Query<Flash>,
) -> Result<Response, AppError> {
    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    let person = match load::<P>(&store, id).await? {
        Ok(person) => person,
        Err(redirect) => return Ok(redirect),
    };

    let template = PersonShowTemplate {
        layout: LayoutView::new(&user, P::BASE),
        flash,
        singular: P::KIND.label(),
        base: P::BASE,
        person,
    };
    Ok(render(&template).into_response())
}

/// Edit form, prefilled.
#[instrument(skip_all, fields(base = P::BASE, person_id = %id))]
pub async fn edit_form<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Response, AppError> {
    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    let person = match load::<P>(&store, id).await? {
        Ok(person) => person,
        Err(redirect) => return Ok(redirect),
    };

    let template = PersonFormTemplate {
        layout: LayoutView::new(&user, P::BASE),
        title: format!("Edit {}", P::KIND.label()),
        base: P::BASE,
        action: format!("{}/{id}/edit", P::BASE),
        form: PersonInput {
            name: person.name,
            email: person.email,
            phone: person.phone,
        },
        errors: PersonErrors::default(),
        show_password: false,
        password_error: None,
        error: None,
    };
    Ok(render(&template).into_response())
}

/// Update a person.
#[instrument(skip_all, fields(base = P::BASE, person_id = %id))]
pub async fn update<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
    Form(form): Form<PersonForm>,
) -> Result<Response, AppError> {
    let input = form.input();
    let validated = validate_person(&input);

    let mut template = PersonFormTemplate {
        layout: LayoutView::new(&user, P::BASE),
        title: format!("Edit {}", P::KIND.label()),
        base: P::BASE,
        action: format!("{}/{id}/edit", P::BASE),
        form: input,
        errors: PersonErrors::default(),
        show_password: false,
        password_error: None,
        error: missing_fields_message(PersonKind::Customer, &form).map(str::to_string),
    };

    let person = match validated {
        Ok(person) => person,
        Err(errors) => {
            template.errors = errors;
            return Ok(render_invalid(&template));
        }
    };

    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    if let Err(redirect) = load::<P>(&store, id).await? {
        return Ok(redirect);
    }

    match store.update(id, &person).await {
        Ok(_) => Ok(redirect_with(
            &format!("{}/{id}", P::BASE),
            &Flash::success(format!("{} updated successfully", P::KIND.label())),
        )),
        Err(e) => {
            template.error = Some(inline_failure(&e)?);
            Ok(render_invalid(&template))
        }
    }
}

/// Delete confirmation.
#[instrument(skip_all, fields(base = P::BASE, person_id = %id))]
pub async fn delete_confirm<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Response, AppError> {
    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    let person = match load::<P>(&store, id).await? {
        Ok(person) => person,
        Err(redirect) => return Ok(redirect),
    };

    let template = PersonDeleteTemplate {
        layout: LayoutView::new(&user, P::BASE),
        singular: P::KIND.label(),
        base: P::BASE,
        person,
    };
    Ok(render(&template).into_response())
}

/// Delete a person. The backend refuses while they own orders; its reason
/// is shown on the list.
#[instrument(skip_all, fields(base = P::BASE, person_id = %id))]
pub async fn delete<P: PeopleSection>(
    RequireRole(user, _): RequireRole<P::Area>,
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Response, AppError> {
    let store = PersonStore::new(user.api(state.backend()), P::KIND);
    if let Err(redirect) = load::<P>(&store, id).await? {
        return Ok(redirect);
    }

    match store.remove(id).await {
        Ok(()) => Ok(redirect_with(
            P::BASE,
            &Flash::success(format!("{} deleted successfully", P::KIND.label())),
        )),
        Err(e) => redirect_failure(P::BASE, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, phone: &str, password: Option<&str>) -> PersonForm {
        PersonForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_fields_message_by_kind() {
        let complete = form("Kari", "kari@example.no", "1234567890", None);
        assert_eq!(missing_fields_message(PersonKind::Customer, &complete), None);
        assert_eq!(
            missing_fields_message(PersonKind::Consultant, &complete),
            Some("All fields are required")
        );

        let blank_phone = form("Kari", "kari@example.no", " ", None);
        assert_eq!(
            missing_fields_message(PersonKind::Customer, &blank_phone),
            Some("Name, email, and phone are required.")
        );

        let consultant = form("Ola", "ola@example.no", "1234567890", Some("hemmelig1"));
        assert_eq!(missing_fields_message(PersonKind::Consultant, &consultant), None);
    }

    #[test]
    fn test_section_paths() {
        assert_eq!(AdminConsultants::BASE, "/admin/konsulent");
        assert_eq!(AdminConsultants::KIND, PersonKind::Consultant);
        assert_eq!(ConsultantCustomers::BASE, "/konsulent/customers");
    }

    #[test]
    fn test_in_section_matches_role() {
        let consultant = Person {
            id: PersonId::new(101),
            name: "Ola".to_string(),
            email: "ola@example.no".to_string(),
            phone: "1234567890".to_string(),
            role_id: tmc_core::RoleId::Consultant,
        };
        assert!(in_section::<AdminConsultants>(&consultant));
        assert!(!in_section::<AdminCustomers>(&consultant));
        assert!(!in_section::<ConsultantCustomers>(&consultant));

        let customer = Person {
            role_id: tmc_core::RoleId::Customer,
            ..consultant
        };
        assert!(in_section::<ConsultantCustomers>(&customer));
        assert!(!in_section::<AdminConsultants>(&customer));
    }
}
