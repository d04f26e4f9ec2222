/// JWT Authentication Middleware
///
/// Guards the protected scopes. Extracts the bearer token from the
/// Authorization header, runs full session validation against the user
/// and role stores, and injects the resolved `CurrentUser` into request
/// extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::session::SessionManager;
use crate::error::{AppError, AuthError};
use crate::repository::{RoleStore, UserStore};

/// Must be applied to every scope that requires authentication; there
/// is no other path into the authenticated state.
pub struct JwtMiddleware {
    session: web::Data<SessionManager>,
    users: web::Data<UserStore>,
    roles: web::Data<RoleStore>,
}

impl JwtMiddleware {
    pub fn new(
        session: web::Data<SessionManager>,
        users: web::Data<UserStore>,
        roles: web::Data<RoleStore>,
    ) -> Self {
        Self {
            session,
            users,
            roles,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            session: self.session.clone(),
            users: self.users.clone(),
            roles: self.roles.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    session: web::Data<SessionManager>,
    users: web::Data<UserStore>,
    roles: web::Data<RoleStore>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract the bearer token from the Authorization header
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| {
                if h.starts_with("Bearer ") {
                    Some(h[7..].to_string())
                } else {
                    None
                }
            });

        let service = self.service.clone();
        let session = self.session.clone();
        let users = self.users.clone();
        let roles = self.roles.clone();

        Box::pin(async move {
            let token = match token {
                Some(token) => token,
                None => {
                    tracing::warn!("Missing or malformed Authorization header");
                    return Err(AppError::from(AuthError::MissingToken).into());
                }
            };

            let current_user = session
                .authenticate_with_role(&token, users.get_ref(), roles.get_ref())
                .await
                .map_err(|e| {
                    tracing::warn!("Request authentication failed: {}", e);
                    Error::from(e)
                })?;

            tracing::debug!(
                user_id = current_user.user.id,
                role = %current_user.role_type,
                "Request authenticated"
            );

            req.extensions_mut().insert(current_user);
            service.call(req).await
        })
    }
}
