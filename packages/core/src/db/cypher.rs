//! Cypher Statements
//!
//! Text of every statement the movie service issues. [`MemoryGraph`] keys its
//! behavior on these exact strings, so edit both together.
//!
//! [`MemoryGraph`]: crate::db::MemoryGraph

/// All movies, best rated first. Cypher sorts `null` before any value under
/// `DESC`, so unrated movies lead the list.
pub const LIST_MOVIES: &str = "\
MATCH (m:Movie)
RETURN m.title AS title, m.rating AS rating
ORDER BY m.rating DESC, m.title ASC";

/// All users in store order.
pub const LIST_USERS: &str = "\
MATCH (u:User)
RETURN u.userId AS userId, u.name AS name, u.age AS age";

/// New user node. Params: `$id`, `$name`, `$age`.
pub const CREATE_USER: &str = "\
CREATE (u:User {userId: $id, name: $name, age: $age})
RETURN u.userId AS userId";

/// Rated and unrated movies for one user, in one round trip. Param: `$name`.
///
/// `collect()` over an OPTIONAL MATCH that found nothing yields a single map
/// with null fields, so each list travels with a count anchor that is `0` in
/// that case. Both branches are optional so a user who rated every movie still
/// gets a row.
pub const USER_MOVIES: &str = "\
MATCH (u:User {name: $name})
WITH u LIMIT 1
OPTIONAL MATCH (u)-[r:RATED]->(rm:Movie)
WITH u, count(rm) AS ratedCount,
     collect({title: rm.title, rating: rm.rating, userRating: toInteger(r.rating)}) AS ratedMovies
OPTIONAL MATCH (um:Movie) WHERE NOT (u)-[:RATED]->(um)
RETURN ratedCount, ratedMovies,
       count(um) AS unratedCount,
       collect({title: um.title, rating: um.rating}) AS unratedMovies";

/// Upsert the RATED edge between an existing user and movie.
/// Params: `$name`, `$movieTitle`, `$rating`. Matches zero rows, and writes
/// nothing, when either endpoint is missing.
pub const RATE_MOVIE: &str = "\
MATCH (u:User {name: $name}), (m:Movie {title: $movieTitle})
MERGE (u)-[r:RATED]->(m)
SET r.rating = $rating
RETURN m.title AS title, r.rating AS rating";

/// Rewrite a movie's rating as the mean of its incoming RATED edges.
/// Param: `$title`. Matches zero rows when the movie is missing or unrated.
pub const RECOMPUTE_RATING: &str = "\
MATCH (m:Movie {title: $title})<-[r:RATED]-(:User)
WITH m, avg(toFloat(r.rating)) AS averageRating
SET m.rating = averageRating
RETURN m.title AS title, m.rating AS updatedRating";
