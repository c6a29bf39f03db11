use std::path::{Path, PathBuf};

use crate::{
    Error, Res,
    cli::download::Session,
    config::{DEFAULT_ARTIST_TEMPLATE, DEFAULT_COLLECTION_TEMPLATE},
    info,
    media::{CollectionContext, Remuxer, Tagger},
    types::{Playlist, Track, User},
    utils::{self, Metadata},
    warning,
};

/// Downloads a set into its own folder below `parent`.
pub async fn set<M: Remuxer, T: Tagger>(
    session: &Session<M, T>,
    playlist: Playlist,
    parent: &Path,
) -> Res<()> {
    let album = Metadata::for_playlist(&playlist);
    let folder = folder(
        parent,
        &album,
        &session.settings.set_folder_template,
    )
    .await?;
    info!(
        "{} - {}",
        album.albumartist.as_deref().unwrap_or_default(),
        album.album.as_deref().unwrap_or_default()
    );

    let tracks = session.client.hydrate_tracks(playlist.tracks).await?;
    let artwork_url = tracks
        .first()
        .and_then(|t| t.artwork_url.clone())
        .or(playlist.artwork_url);

    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: &session.settings.template,
        number_override: None,
        artwork_url,
    };
    session
        .orchestrator()
        .process_collection(&tracks, &ctx)
        .await
        .print();
    Ok(())
}

/// Downloads one track into its own folder below `parent`.
///
/// A `?in=<user>/sets/<set>` suffix on `url` numbers the track by its
/// position in that set.
pub async fn track<M: Remuxer, T: Tagger>(
    session: &Session<M, T>,
    track: Track,
    url: &str,
    parent: &Path,
    number: u32,
    total: u32,
) -> Res<()> {
    let (number, total) = match url.split_once("?in=") {
        Some((_, set_path)) => position_in_set(session, &track, set_path).await?,
        None => (number, total),
    };

    let album = Metadata::for_single(&track, total);
    let folder = folder(
        parent,
        &album,
        &session.settings.track_folder_template,
    )
    .await?;
    info!(
        "{} - {}",
        album.albumartist.as_deref().unwrap_or_default(),
        track.title()
    );

    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: &session.settings.template,
        number_override: Some(number),
        artwork_url: track.artwork_url.clone(),
    };
    session
        .orchestrator()
        .process_collection(std::slice::from_ref(&track), &ctx)
        .await
        .print();
    Ok(())
}

/// Downloads every album of an artist, one folder per album.
pub async fn albums<M: Remuxer, T: Tagger>(session: &Session<M, T>, url: &str) -> Res<()> {
    let artist = session.client.artist_info(url).await?;
    let artist_folder = artist_folder(session, &artist).await?;
    info!("{}'s albums", artist.username);

    let albums = session.client.artist_albums(artist.id).await?;
    if albums.is_empty() {
        return Err(Error::Api("artist does not have any albums".to_string()));
    }

    let total = albums.len();
    for (index, album) in albums.into_iter().enumerate() {
        println!();
        info!("Album {} of {}:", index + 1, total);

        if let Err(e) = album_set(session, album, &artist_folder).await {
            warning!("Album {} of {} failed: {}", index + 1, total, e);
        }
    }
    Ok(())
}

/// Downloads every track of an artist, one folder per track.
pub async fn tracks<M: Remuxer, T: Tagger>(session: &Session<M, T>, url: &str) -> Res<()> {
    let artist = session.client.artist_info(url).await?;
    let artist_folder = artist_folder(session, &artist).await?;
    info!("{}'s tracks", artist.username);

    let tracks = session.client.artist_tracks(artist.id).await?;
    if tracks.is_empty() {
        return Err(Error::Api("artist does not have any tracks".to_string()));
    }

    let total = tracks.len() as u32;
    for (index, item) in tracks.into_iter().enumerate() {
        let number = index as u32 + 1;
        println!();
        info!("Track {} of {}:", number, total);
        let permalink = item.permalink_url.clone().unwrap_or_default();
        if let Err(e) = track(session, item, &permalink, &artist_folder, number, total).await {
            warning!("Track {} of {} failed: {}", number, total, e);
        }
    }
    Ok(())
}

/// Downloads the signed-in user's liked tracks, one folder per track.
pub async fn likes<M: Remuxer, T: Tagger>(session: &Session<M, T>) -> Res<()> {
    let likes_folder = session
        .settings
        .output_path
        .join(&session.settings.likes_folder);
    async_fs::create_dir_all(&likes_folder).await?;
    info!("Likes");

    let likes = session.client.user_likes().await?;
    if likes.is_empty() {
        return Err(Error::Api("you do not have any likes".to_string()));
    }

    let total = likes.len() as u32;
    for (index, like) in likes.into_iter().enumerate() {
        let number = index as u32 + 1;
        println!();
        info!("Track {} of {}:", number, total);
        let liked = like.track;
        let permalink = liked.permalink_url.clone().unwrap_or_default();
        if let Err(e) = track(session, liked, &permalink, &likes_folder, number, total).await {
            warning!("Track {} of {} failed: {}", number, total, e);
        }
    }
    Ok(())
}

/// Album listings may omit the track list; those are resolved again by
/// permalink first.
async fn album_set<M: Remuxer, T: Tagger>(
    session: &Session<M, T>,
    album: Playlist,
    parent: &Path,
) -> Res<()> {
    let album = match album.permalink_url.clone() {
        Some(permalink) if album.tracks.is_empty() => session.client.resolve(&permalink).await?,
        _ => album,
    };
    set(session, album, parent).await
}

/// Number and total of `track` inside the set at `set_path`.
async fn position_in_set<M: Remuxer, T: Tagger>(
    session: &Session<M, T>,
    track: &Track,
    set_path: &str,
) -> Res<(u32, u32)> {
    let set_url = format!("{}/{}", session.client.web_url(), set_path);
    let playlist: Playlist = session.client.resolve(&set_url).await?;
    let total = playlist.tracks.len() as u32;

    match playlist.tracks.iter().position(|t| t.id == track.id) {
        Some(index) => Ok((index as u32 + 1, total)),
        None => {
            warning!("Track is not part of {}, numbering it 1 of 1.", set_url);
            Ok((1, 1))
        }
    }
}

async fn folder(parent: &Path, album: &Metadata, template: &str) -> Res<PathBuf> {
    let name = utils::parse_template(&album.values(), template, DEFAULT_COLLECTION_TEMPLATE);
    let path = parent.join(name);
    async_fs::create_dir_all(&path).await?;
    Ok(path)
}

async fn artist_folder<M: Remuxer, T: Tagger>(
    session: &Session<M, T>,
    artist: &User,
) -> Res<PathBuf> {
    let name = utils::parse_template(
        &utils::user_values(artist),
        &session.settings.artist_folder_template,
        DEFAULT_ARTIST_TEMPLATE,
    );
    let path = session.settings.output_path.join(name);
    async_fs::create_dir_all(&path).await?;
    Ok(path)
}
