//! Campaign pages: view a campaign, sign it, and start a new one.
//!
//! These functions are synchronous and take the store directly; the axum
//! handlers in `routes` run them on the blocking pool.

use rusqlite::Connection;
use tracing::{debug, info};

use sigcolle_db::Database;
use sigcolle_db::models::{NewCampaign, NewSignature};
use sigcolle_db::queries;
use sigcolle_types::forms::{CampaignCreateForm, CampaignParams, SignatureForm, ValidationErrors};

use crate::error::CampaignError;
use crate::markdown;
use crate::session::Session;
use crate::views::{CampaignPage, FormPage, Outcome, View};

pub const SIGNED_FLASH: &str = "Thank you for your support!";
pub const CREATED_FLASH: &str = "Your campaign has been created! Hooray!";

/// Where visitors without a session are sent. Relative to `/campaign/sign`.
pub const REGISTER_PATH: &str = "../../register";

/// Progress line shown under the signature count.
pub fn progress_message(goal: i64, signature_count: i64) -> String {
    let remaining = goal - signature_count;
    if remaining <= 0 {
        format!("{} people have joined and the goal has been achieved!", goal)
    } else {
        format!(
            "{} more supporters are needed to reach the goal of {}!",
            remaining, goal
        )
    }
}

/// GET /campaign/{campaign_id}
pub fn index(
    db: &Database,
    params: &CampaignParams,
    flash: Option<String>,
) -> Result<Outcome, CampaignError> {
    let campaign_id = match params.campaign_id() {
        Some(id) if params.validate().is_empty() => id,
        _ => return Ok(Outcome::Invalid),
    };

    let page = db.with_conn(|conn| {
        show_campaign(
            conn,
            campaign_id,
            SignatureForm::default(),
            ValidationErrors::new(),
            flash,
        )
    })?;
    Ok(Outcome::Page(View::Campaign(page)))
}

/// POST /campaign/sign
pub fn sign(
    db: &Database,
    form: SignatureForm,
    session: Option<&Session>,
) -> Result<Outcome, CampaignError> {
    if session.is_none() {
        return Ok(Outcome::redirect(REGISTER_PATH));
    }

    let errors = form.validate();
    let campaign_id = form
        .campaign_id()
        .ok_or_else(|| CampaignError::BadCampaignId(form.campaign_id.clone()))?;

    if !errors.is_empty() {
        debug!("Signature form for campaign {} rejected", campaign_id);
        let page = db.with_conn(|conn| show_campaign(conn, campaign_id, form, errors, None))?;
        return Ok(Outcome::Page(View::Campaign(page)));
    }

    let signature_id = db.transaction(|tx| {
        queries::insert_signature(
            tx,
            &NewSignature {
                campaign_id,
                name: &form.name,
                signature_comment: form.comment(),
            },
        )
    })?;
    info!("Signature {} added to campaign {}", signature_id, campaign_id);

    Ok(Outcome::redirect_with_flash(
        format!("/campaign/{}", campaign_id),
        SIGNED_FLASH,
    ))
}

/// GET /campaign/new
pub fn new_campaign() -> Outcome {
    Outcome::Page(View::NewCampaign(FormPage::default()))
}

/// POST /campaign
///
/// Titles are not checked for duplicates.
pub fn create(
    db: &Database,
    form: CampaignCreateForm,
    session: Option<&Session>,
) -> Result<Outcome, CampaignError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Outcome::Page(View::NewCampaign(FormPage::new(form, errors))));
    }

    let principal = session
        .map(Session::principal)
        .ok_or(CampaignError::Unauthenticated)?;

    let statement = markdown::to_html(&form.statement);
    let goal: i64 = form.goal.parse()?;

    let campaign_id = db.transaction(|tx| {
        queries::insert_campaign(
            tx,
            &NewCampaign {
                title: &form.title,
                statement: &statement,
                goal,
                create_user_id: principal.user_id,
            },
        )
    })?;
    info!(
        "Campaign {} created by user {}",
        campaign_id, principal.user_id
    );

    Ok(Outcome::redirect_with_flash(
        format!("/campaign/{}", campaign_id),
        CREATED_FLASH,
    ))
}

/// GET /my/campaigns
pub fn list_campaigns(_session: Option<&Session>) -> Result<Outcome, CampaignError> {
    Err(CampaignError::NotImplemented("list_campaigns"))
}

fn show_campaign(
    conn: &Connection,
    campaign_id: i64,
    signature: SignatureForm,
    errors: ValidationErrors,
    message: Option<String>,
) -> anyhow::Result<CampaignPage> {
    let campaign = queries::select_campaign_by_id(conn, campaign_id)?;
    let user = queries::select_user_by_id(conn, campaign.create_user_id)?;
    let signature_count = queries::count_signatures_by_campaign_id(conn, campaign_id)?;

    Ok(CampaignPage {
        sign_message: progress_message(campaign.goal, signature_count),
        campaign: campaign.into(),
        user: user.into(),
        signature_count,
        signature,
        errors,
        message,
    })
}
