use chrono::Duration;
use log::info;
use rouille::{Request, Response};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{password, sessions::Sessions},
    catalog::Catalog,
    config::{AuthConfig, HttpConfig},
    domain::{album::Album, id::DocId, track::Track, user::User},
    http::error::ApiError,
    storage::{albums::AlbumStore, db, error::StorageError, tracks::TrackStore, users::UserStore},
};

pub struct HttpServer {
    users: UserStore,
    tracks: TrackStore,
    albums: AlbumStore,
    catalog: Catalog,
    sessions: Sessions,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(conn: Connection, config: HttpConfig, auth: AuthConfig) -> Self {
        let handle = db::share(conn);
        let tracks = TrackStore::new(handle.clone());
        let albums = AlbumStore::new(handle.clone());
        let users = UserStore::new(handle);
        let catalog = Catalog::new(tracks.clone(), albums.clone());
        let sessions = Sessions::new(Duration::minutes(auth.session_ttl_minutes));

        Self {
            users,
            tracks,
            albums,
            catalog,
            sessions,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (POST) (/login) => { respond(self.login(request)) },
            (POST) (/logout) => { respond(self.logout(request)) },
            (GET) (/me) => { respond(self.me(request)) },

            (POST) (/users) => { respond(self.create_user(request)) },
            (POST) (/users/password) => { respond(self.change_password(request)) },
            (GET) (/users/{id: String}) => { respond(self.get_user(&id)) },
            (PUT) (/users/{id: String}) => { respond(self.update_user(request, &id)) },
            (DELETE) (/users/{id: String}) => { respond(self.delete_user(request, &id)) },

            (POST) (/tracks) => { respond(self.create_track(request)) },
            (GET) (/tracks) => { respond(self.list_tracks()) },
            (GET) (/tracks/{id: String}) => { respond(self.get_track(&id)) },
            (PUT) (/tracks/{id: String}) => { respond(self.update_track(request, &id)) },
            (DELETE) (/tracks/{id: String}) => { respond(self.delete_track(request, &id)) },

            (POST) (/albums) => { respond(self.create_album(request)) },
            (GET) (/albums) => { respond(self.list_albums()) },
            (GET) (/albums/{id: String}) => { respond(self.get_album(&id)) },
            (PUT) (/albums/{id: String}) => { respond(self.update_album(request, &id)) },
            (DELETE) (/albums/{id: String}) => { respond(self.delete_album(request, &id)) },

            (POST) (/albums/{id: String}/tracks) => {
                respond(self.attach_new_track(request, &id))
            },
            (PUT) (/albums/{id: String}/tracks/{track_id: String}) => {
                respond(self.attach_existing_track(request, &id, &track_id))
            },
            (DELETE) (/albums/{id: String}/tracks/{track_id: String}) => {
                respond(self.detach_track(request, &id, &track_id))
            },

            (GET) (/search) => { respond(self.search(request)) },

            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    /// Resolves the bearer token to a user id; mutating endpoints call this
    /// before touching storage.
    fn authorize(&self, request: &Request) -> Result<String, ApiError> {
        self.sessions
            .authenticate(request.header("Authorization"))
            .ok_or_else(|| ApiError::Unauthorized("missing or invalid token".into()))
    }

    // --------------------------------------------------
    // auth
    // --------------------------------------------------

    fn login(&self, request: &Request) -> Result<Response, ApiError> {
        let body: LoginRequest = json_body(request)?;
        let user = self.users.verify_credentials(&body.username, &body.password)?;
        let token = self.sessions.issue(&user.id);

        Ok(Response::json(&LoginResponse {
            token,
            user_id: user.id,
        }))
    }

    fn logout(&self, request: &Request) -> Result<Response, ApiError> {
        self.authorize(request)?;
        self.sessions.revoke(request.header("Authorization"));
        Ok(Response::empty_204())
    }

    fn me(&self, request: &Request) -> Result<Response, ApiError> {
        let user_id = self.authorize(request)?;
        Ok(Response::json(&MeResponse { user_id }))
    }

    // --------------------------------------------------
    // users
    // --------------------------------------------------

    fn create_user(&self, request: &Request) -> Result<Response, ApiError> {
        let body: UserPayload = json_body(request)?;
        check_user(&body)?;

        let mut user = User {
            id: String::new(),
            username: body.username,
            password: password::digest(&body.password),
        };
        self.users.create(&mut user)?;

        Ok(Response::json(&UserResponse::from_domain(&user)).with_status_code(201))
    }

    fn get_user(&self, id: &str) -> Result<Response, ApiError> {
        let id = parse_id(id)?;
        let user = self.users.get(&id)?;
        Ok(Response::json(&UserResponse::from_domain(&user)))
    }

    fn update_user(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        let body: UserPayload = json_body(request)?;
        check_user(&body)?;

        let mut user = User {
            id: String::new(),
            username: body.username,
            password: password::digest(&body.password),
        };
        self.users.update(&id, &mut user)?;

        Ok(Response::json(&UserResponse::from_domain(&user)))
    }

    fn change_password(&self, request: &Request) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let body: ChangePasswordRequest = json_body(request)?;
        if body.username.is_empty() || body.old_password.is_empty() || body.new_password.is_empty()
        {
            return Err(ApiError::BadRequest("wrong input structure".into()));
        }

        self.users
            .change_password(&body.username, &body.old_password, &body.new_password)?;
        Ok(Response::empty_204())
    }

    fn delete_user(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        self.users.delete(&id)?;
        Ok(Response::empty_204())
    }

    // --------------------------------------------------
    // tracks
    // --------------------------------------------------

    fn create_track(&self, request: &Request) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let mut track: Track = json_body(request)?;
        check_track(&track)?;

        self.tracks.create(&mut track)?;
        Ok(Response::json(&track).with_status_code(201))
    }

    fn list_tracks(&self) -> Result<Response, ApiError> {
        Ok(Response::json(&self.tracks.list()?))
    }

    fn get_track(&self, id: &str) -> Result<Response, ApiError> {
        let id = parse_id(id)?;
        Ok(Response::json(&self.tracks.get(&id)?))
    }

    fn update_track(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        let mut track: Track = json_body(request)?;
        check_track(&track)?;

        self.tracks.update(&id, &mut track)?;
        Ok(Response::json(&track))
    }

    fn delete_track(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        self.tracks.delete(&id)?;
        Ok(Response::empty_204())
    }

    // --------------------------------------------------
    // albums
    // --------------------------------------------------

    fn create_album(&self, request: &Request) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let mut album: Album = json_body(request)?;
        check_album(&album)?;

        self.albums.create(&mut album)?;
        Ok(Response::json(&album).with_status_code(201))
    }

    fn list_albums(&self) -> Result<Response, ApiError> {
        Ok(Response::json(&self.albums.list()?))
    }

    fn get_album(&self, id: &str) -> Result<Response, ApiError> {
        let id = parse_id(id)?;
        Ok(Response::json(&self.albums.get(&id)?))
    }

    fn update_album(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        let mut album: Album = json_body(request)?;
        check_album(&album)?;

        self.albums.update(&id, &mut album)?;
        Ok(Response::json(&album))
    }

    fn delete_album(&self, request: &Request, id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let id = parse_id(id)?;
        self.albums.delete(&id)?;
        Ok(Response::empty_204())
    }

    // --------------------------------------------------
    // association + search
    // --------------------------------------------------

    fn attach_new_track(&self, request: &Request, album_id: &str) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let album_id = parse_id(album_id)?;
        let track: Track = json_body(request)?;
        check_track(&track)?;
        if !track.id.is_empty() {
            parse_id(&track.id)?;
        }

        let attached = self.catalog.attach_new_track(&album_id, track)?;
        Ok(Response::json(&attached).with_status_code(201))
    }

    fn attach_existing_track(
        &self,
        request: &Request,
        album_id: &str,
        track_id: &str,
    ) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let album_id = parse_id(album_id)?;
        let track_id = parse_id(track_id)?;

        self.catalog.attach_existing_track(&album_id, &track_id)?;
        Ok(Response::empty_204())
    }

    fn detach_track(
        &self,
        request: &Request,
        album_id: &str,
        track_id: &str,
    ) -> Result<Response, ApiError> {
        self.authorize(request)?;
        let album_id = parse_id(album_id)?;
        let track_id = parse_id(track_id)?;

        self.catalog.detach_track(&album_id, &track_id)?;
        Ok(Response::empty_204())
    }

    fn search(&self, request: &Request) -> Result<Response, ApiError> {
        let keyword = request.get_param("q").unwrap_or_default();
        let (albums, tracks) = self.catalog.search(&keyword)?;
        Ok(Response::json(&SearchResponse { albums, tracks }))
    }
}

fn respond(result: Result<Response, ApiError>) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

fn parse_id(raw: &str) -> Result<DocId, ApiError> {
    DocId::parse(raw).map_err(ApiError::from)
}

fn json_body<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, ApiError> {
    rouille::input::json_input(request)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

fn check_track(track: &Track) -> Result<(), ApiError> {
    let required = [
        ("title", &track.title),
        ("artist", &track.artist),
        ("genre", &track.genre),
        ("release_year", &track.release_year),
        ("duration", &track.duration),
        ("file_name", &track.file_name),
    ];
    for (name, value) in required {
        if value.is_empty() {
            return Err(ApiError::from(StorageError::MissingField(name)));
        }
    }
    Ok(())
}

fn check_album(album: &Album) -> Result<(), ApiError> {
    if album.title.is_empty() {
        return Err(ApiError::from(StorageError::MissingField("title")));
    }
    if album.cover.is_empty() {
        return Err(ApiError::from(StorageError::MissingField("cover")));
    }
    Ok(())
}

fn check_user(user: &UserPayload) -> Result<(), ApiError> {
    if user.username.is_empty() {
        return Err(ApiError::from(StorageError::MissingField("username")));
    }
    if user.password.is_empty() {
        return Err(ApiError::from(StorageError::MissingField("password")));
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    token: String,
    user_id: String,
}

#[derive(Serialize, Deserialize)]
struct MeResponse {
    user_id: String,
}

#[derive(Serialize, Deserialize)]
struct ChangePasswordRequest {
    username: String,
    old_password: String,
    new_password: String,
}

#[derive(Serialize, Deserialize)]
struct UserPayload {
    username: String,
    password: String,
}

/// User representation returned by the API; the stored digest never
/// leaves the process.
#[derive(Serialize, Deserialize)]
struct UserResponse {
    id: String,
    username: String,
}

impl UserResponse {
    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SearchResponse {
    albums: Vec<Album>,
    tracks: Vec<Track>,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
