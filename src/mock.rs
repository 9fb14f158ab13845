//! Fixed synthetic data shown whenever the real backends are disabled or unreachable.
use chrono::{DateTime, Duration, Utc};

use crate::models::{Genre, Movie, MovieDetails, ProductionCompany, SavedMovieRecord};
use crate::tmdb::parse_tmdb_id;

pub const MOCK_USER_ID: &str = "user123";
pub const DEFAULT_DETAILS_ID: i64 = 1234567;

const SAVED_CATALOG: [(&str, i64, &str, &str, i64); 6] = [
    (
        "1",
        447365,
        "Guardians of the Galaxy Vol. 3",
        "/r2J02Z2OpNTctfOSN1Ydgii51I3.jpg",
        3,
    ),
    (
        "2",
        667538,
        "Transformers: Rise of the Beasts",
        "/gPbM0MK8CP8A174rmUwGsADNYKD.jpg",
        7,
    ),
    (
        "3",
        569094,
        "Spider-Man: Across the Spider-Verse",
        "/8Vt6mWEReuy4Of61Lnj5Xj704m8.jpg",
        10,
    ),
    ("4", 298618, "The Flash", "/rktDFPbfHfUbArZ6OOOKsXcv0Bm.jpg", 14),
    ("5", 385687, "Fast X", "/fiVW06jE7z9YnO4trhaMEdclSiC.jpg", 21),
    (
        "6",
        882569,
        "Guy Ritchie's The Covenant",
        "/kVG8zFFYrpyYLoHChuEeOGAd6Ru.jpg",
        30,
    ),
];

pub fn generate_saved_movies(count: usize) -> Vec<SavedMovieRecord> {
    generate_saved_movies_at(count, Utc::now())
}

/// Same as [`generate_saved_movies`] with `createdAt` offsets taken from `now`.
pub fn generate_saved_movies_at(count: usize, now: DateTime<Utc>) -> Vec<SavedMovieRecord> {
    SAVED_CATALOG
        .iter()
        .take(count)
        .map(|(id, movie_id, title, poster, days_ago)| SavedMovieRecord {
            id: id.to_string(),
            movie_id: *movie_id,
            title: title.to_string(),
            poster_path: poster.to_string(),
            user_id: MOCK_USER_ID.to_string(),
            created_at: now - Duration::days(*days_ago),
        })
        .collect()
}

pub fn get_movie_details(id: Option<i64>) -> MovieDetails {
    match id {
        Some(447365) => guardians_vol_3(),
        Some(569094) => across_the_spider_verse(),
        _ => default_details(),
    }
}

/// Route-level lookup: ids that are not numeric get the default record.
pub fn get_movie_details_for(raw: Option<&str>) -> MovieDetails {
    get_movie_details(raw.and_then(parse_tmdb_id))
}

fn genres(list: &[(i64, &str)]) -> Vec<Genre> {
    list.iter()
        .map(|(id, name)| Genre {
            id: *id,
            name: name.to_string(),
        })
        .collect()
}

fn company(id: i64, name: &str, logo: Option<&str>) -> ProductionCompany {
    ProductionCompany {
        id,
        name: name.to_string(),
        logo_path: logo.map(str::to_string),
    }
}

fn guardians_vol_3() -> MovieDetails {
    MovieDetails {
        movie: Movie {
            id: 447365,
            title: "Guardians of the Galaxy Vol. 3".to_string(),
            overview: "Peter Quill, still reeling from the loss of Gamora, must rally his team around him to defend the universe along with protecting one of their own. A mission that, if not completed successfully, could quite possibly lead to the end of the Guardians as we know them.".to_string(),
            poster_path: "/r2J02Z2OpNTctfOSN1Ydgii51I3.jpg".to_string(),
            backdrop_path: "/5YZbUmjbMa3ClvSW1Wj3D6XGolb.jpg".to_string(),
            release_date: "2023-05-03".to_string(),
            vote_average: 8.1,
            vote_count: 4255,
            genre_ids: vec![878, 12, 28],
        },
        genres: genres(&[(878, "Science Fiction"), (12, "Adventure"), (28, "Action")]),
        runtime: Some(150),
        status: "Released".to_string(),
        tagline: "Once more with feeling.".to_string(),
        budget: 250_000_000,
        revenue: 845_555_777,
        production_companies: vec![company(
            420,
            "Marvel Studios",
            Some("/hUzeosd33nzE5MCNsZxCGEKTXaQ.png"),
        )],
    }
}

fn across_the_spider_verse() -> MovieDetails {
    MovieDetails {
        movie: Movie {
            id: 569094,
            title: "Spider-Man: Across the Spider-Verse".to_string(),
            overview: "After reuniting with Gwen Stacy, Brooklyn's full-time, friendly neighborhood Spider-Man is catapulted across the Multiverse, where he encounters the Spider Society, a team of Spider-People charged with protecting the Multiverse's very existence. But when the heroes clash on how to handle a new threat, Miles finds himself pitted against the other Spiders and must set out on his own to save those he loves most.".to_string(),
            poster_path: "/8Vt6mWEReuy4Of61Lnj5Xj704m8.jpg".to_string(),
            backdrop_path: "/4HodYYKEIsGOdinkGi2Ucz6X9i0.jpg".to_string(),
            release_date: "2023-05-31".to_string(),
            vote_average: 8.4,
            vote_count: 5121,
            genre_ids: vec![16, 28, 12],
        },
        genres: genres(&[(16, "Animation"), (28, "Action"), (12, "Adventure")]),
        runtime: Some(140),
        status: "Released".to_string(),
        tagline: "It's how you wear the mask that matters".to_string(),
        budget: 100_000_000,
        revenue: 690_516_673,
        production_companies: vec![
            company(5, "Columbia Pictures", Some("/71BqEFAF4V3qjjMPCpLuyJFB9A.png")),
            company(
                7505,
                "Sony Pictures Animation",
                Some("/c8VtxGbEJqSWvuRGm5eLeFFEOWI.png"),
            ),
        ],
    }
}

fn default_details() -> MovieDetails {
    MovieDetails {
        movie: Movie {
            id: DEFAULT_DETAILS_ID,
            title: "Example Movie Title".to_string(),
            overview: "This is a placeholder movie generated when the actual movie details couldn't be loaded. It contains sample data for demonstration purposes only.".to_string(),
            poster_path: "/kVG8zFFYrpyYLoHChuEeOGAd6Ru.jpg".to_string(),
            backdrop_path: "/5YZbUmjbMa3ClvSW1Wj3D6XGolb.jpg".to_string(),
            release_date: "2023-01-01".to_string(),
            vote_average: 7.5,
            vote_count: 1000,
            genre_ids: vec![28, 12, 878],
        },
        genres: genres(&[(28, "Action"), (12, "Adventure"), (878, "Science Fiction")]),
        runtime: Some(120),
        status: "Released".to_string(),
        tagline: "Example tagline for this movie".to_string(),
        budget: 100_000_000,
        revenue: 350_000_000,
        production_companies: vec![company(1, "Example Studios", None)],
    }
}
