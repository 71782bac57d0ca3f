use crate::{
    api::{ingest, lookup, manage, report, schedule},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/manual-login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::manual_login)),
            )
            .service(
                web::resource("/barcode-login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::barcode_login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope("")
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::resource("/upload-attendance")
                    .route(web::post().to(ingest::upload_attendance)),
            )
            .service(
                web::resource("/download-attendance")
                    .route(web::get().to(report::download_attendance)),
            )
            .service(
                web::resource("/insert-time-slot")
                    .route(web::post().to(schedule::insert_time_slot)),
            )
            .service(
                web::resource("/save-schedule-changes")
                    .route(web::post().to(schedule::save_schedule_changes)),
            )
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/subjects").route(web::get().to(lookup::subjects)),
                    )
                    .service(
                        web::resource("/sections").route(web::get().to(lookup::sections)),
                    )
                    .service(
                        web::resource("/sessions").route(web::get().to(lookup::sessions)),
                    )
                    .service(
                        web::resource("/attendance").route(web::get().to(lookup::attendance)),
                    )
                    .service(
                        web::resource("/students").route(web::get().to(lookup::students)),
                    )
                    .service(
                        web::resource("/student-number")
                            .route(web::get().to(lookup::student_number)),
                    )
                    .service(
                        web::resource("/fiscal-years")
                            .route(web::get().to(lookup::fiscal_years)),
                    )
                    .service(
                        web::resource("/semesters").route(web::get().to(lookup::semesters)),
                    )
                    .service(
                        web::resource("/schedule").route(web::get().to(schedule::schedule_view)),
                    )
                    .service(
                        web::resource("/manage-subject")
                            .route(web::get().to(manage::list_subjects))
                            .route(web::post().to(manage::create_subject)),
                    )
                    .service(
                        web::resource("/manage-subject/{id}")
                            .route(web::put().to(manage::update_subject))
                            .route(web::delete().to(manage::delete_subject)),
                    )
                    .service(
                        web::resource("/manage-section")
                            .route(web::get().to(manage::list_sections))
                            .route(web::post().to(manage::create_section)),
                    )
                    .service(
                        web::resource("/manage-section/{id}")
                            .route(web::delete().to(manage::delete_section)),
                    ),
            ),
    );
}

// LOGIN
//  └─ access_token (one teaching day)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ log in again with the access code or barcode
