use serde::Serialize;
use tera::{Context, Tera};
use tracing::info;

use sigcolle_types::api::{LoginForm, RegisterForm};
use sigcolle_types::forms::{CampaignCreateForm, SignatureForm, ValidationErrors};
use sigcolle_types::models::{Campaign, User};

/// Templates compiled into the binary; `layout.html` is the base the others extend.
const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("campaign/index.html", include_str!("../templates/campaign/index.html")),
    ("campaign/new.html", include_str!("../templates/campaign/new.html")),
    ("auth/register.html", include_str!("../templates/auth/register.html")),
    ("auth/login.html", include_str!("../templates/auth/login.html")),
];

/// What a handler produced, before the transport turns it into HTTP.
#[derive(Debug)]
pub enum Outcome {
    Page(View),
    /// 303 See Other, optionally carrying a one-shot flash message.
    Redirect {
        location: String,
        flash: Option<String>,
    },
    /// Malformed request parameters: 400 with a generic body.
    Invalid,
}

impl Outcome {
    pub fn redirect(location: impl Into<String>) -> Self {
        Outcome::Redirect {
            location: location.into(),
            flash: None,
        }
    }

    pub fn redirect_with_flash(location: impl Into<String>, flash: impl Into<String>) -> Self {
        Outcome::Redirect {
            location: location.into(),
            flash: Some(flash.into()),
        }
    }
}

#[derive(Debug)]
pub enum View {
    Campaign(CampaignPage),
    NewCampaign(FormPage<CampaignCreateForm>),
    Register(FormPage<RegisterForm>),
    Login(FormPage<LoginForm>),
}

impl View {
    pub fn template(&self) -> &'static str {
        match self {
            View::Campaign(_) => "campaign/index.html",
            View::NewCampaign(_) => "campaign/new.html",
            View::Register(_) => "auth/register.html",
            View::Login(_) => "auth/login.html",
        }
    }

    fn context(&self) -> tera::Result<Context> {
        match self {
            View::Campaign(page) => Context::from_serialize(page),
            View::NewCampaign(page) => Context::from_serialize(page),
            View::Register(page) => Context::from_serialize(page),
            View::Login(page) => Context::from_serialize(page),
        }
    }
}

/// Everything the campaign detail page shows.
#[derive(Debug, Serialize)]
pub struct CampaignPage {
    pub campaign: Campaign,
    pub user: User,
    pub signature_count: i64,
    pub sign_message: String,
    pub signature: SignatureForm,
    pub errors: ValidationErrors,
    pub message: Option<String>,
}

/// A form re-displayed with its entered values and any field errors.
#[derive(Debug, Default, Serialize)]
pub struct FormPage<F> {
    pub form: F,
    pub errors: ValidationErrors,
}

impl<F> FormPage<F> {
    pub fn new(form: F, errors: ValidationErrors) -> Self {
        Self { form, errors }
    }
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        info!("Loaded {} templates", TEMPLATES.len());
        Ok(Self { tera })
    }

    pub fn render(&self, view: &View) -> tera::Result<String> {
        self.tera.render(view.template(), &view.context()?)
    }
}
